//! Paths and literals.

use crate::context::AnalysisContext;
use smol_str::SmolStr;
use tplgen_ir::{format_number, GenPath, Literal, PathSegment};
use tplgen_parser::ast::{Expr, Lit, MemberExpr, MemberProp, OptChainBase, Str, TplElement};

/// Strip parentheses and TypeScript-only wrappers.
pub fn unwrap_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(p) => unwrap_expr(&p.expr),
        Expr::TsAs(e) => unwrap_expr(&e.expr),
        Expr::TsNonNull(e) => unwrap_expr(&e.expr),
        Expr::TsSatisfies(e) => unwrap_expr(&e.expr),
        Expr::TsConstAssertion(e) => unwrap_expr(&e.expr),
        Expr::TsTypeAssertion(e) => unwrap_expr(&e.expr),
        _ => expr,
    }
}

/// Match `obj.prop` and `obj?.prop`.
pub fn as_member(expr: &Expr) -> Option<&MemberExpr> {
    match unwrap_expr(expr) {
        Expr::Member(member) => Some(member),
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => Some(member),
            OptChainBase::Call(_) => None,
        },
        _ => None,
    }
}

/// Convert a reference expression (`a`, `a.b`, `a?.b`, `a[0]`, `a["b"]`)
/// into a path, without resolving props.
pub fn raw_path(expr: &Expr) -> Option<GenPath> {
    let expr = unwrap_expr(expr);
    if let Expr::Ident(ident) = expr {
        let name: &str = &ident.sym;
        if name == "undefined" {
            return None;
        }
        return Some(GenPath::new(vec![PathSegment::Key(SmolStr::new(name))]));
    }

    let member = as_member(expr)?;
    let mut path = raw_path(&member.obj)?;
    let segment = match &member.prop {
        MemberProp::Ident(ident) => match &*ident.sym {
            "length" => PathSegment::Length,
            name => PathSegment::Key(SmolStr::new(name)),
        },
        MemberProp::Computed(computed) => match unwrap_expr(&computed.expr) {
            Expr::Lit(Lit::Num(num)) if num.value >= 0.0 && num.value.fract() == 0.0 => {
                PathSegment::Index(num.value as u32)
            }
            Expr::Lit(Lit::Str(s)) => PathSegment::Key(SmolStr::new(string_value(s))),
            _ => return None,
        },
        MemberProp::PrivateName(_) => return None,
    };
    if path.is_length() {
        return None;
    }
    path.segments.push(segment);
    Some(path)
}

/// Convert a reference expression into a data path.
pub fn to_path(ctx: &AnalysisContext, expr: &Expr) -> Option<GenPath> {
    raw_path(expr).map(|path| ctx.resolve_path(path))
}

/// Convert a literal expression.
pub fn to_literal(expr: &Expr) -> Option<Literal> {
    match unwrap_expr(expr) {
        Expr::Lit(Lit::Str(s)) => Some(Literal::Str(string_value(s))),
        Expr::Lit(Lit::Num(num)) => Some(Literal::Num(num.value)),
        Expr::Lit(Lit::Bool(b)) => Some(Literal::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Literal::Null),
        Expr::Ident(ident) if &*ident.sym == "undefined" => Some(Literal::Null),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            Some(Literal::Str(tpl.quasis.iter().map(quasi_text).collect()))
        }
        Expr::Unary(unary) if unary.op == tplgen_parser::ast::UnaryOp::Minus => {
            match unwrap_expr(&unary.arg) {
                Expr::Lit(Lit::Num(num)) => Some(Literal::Num(-num.value)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Literal text for a string or number literal in child position.
pub fn literal_text(expr: &Expr) -> Option<String> {
    match unwrap_expr(expr) {
        Expr::Lit(Lit::Str(s)) => Some(string_value(s)),
        Expr::Lit(Lit::Num(num)) => Some(format_number(num.value)),
        _ => None,
    }
}

/// The decoded value of a string literal.
pub fn string_value(s: &Str) -> String {
    s.value.to_string_lossy().into_owned()
}

/// The decoded text of a template literal chunk.
pub fn quasi_text(quasi: &TplElement) -> String {
    match &quasi.cooked {
        Some(cooked) => cooked.to_string_lossy().into_owned(),
        None => quasi.raw.to_string(),
    }
}
