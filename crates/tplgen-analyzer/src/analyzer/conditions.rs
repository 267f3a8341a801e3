//! Conditional detection: `a && body`, `a ? b : c ? d : e`.
//!
//! `a && body` becomes a condition with no else branch. When `a` is `0`,
//! React renders the text `0` where the templates render nothing.

use super::paths::{to_literal, to_path, unwrap_expr};
use crate::context::AnalysisContext;
use tplgen_ir::{CompareOp, GenExpr};
use tplgen_parser::ast::{BinaryOp, Expr, Lit, OptChainBase, UnaryOp};
use tplgen_parser::{Spanned, SyntaxSpan};

/// Why a predicate could not be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateIssue {
    /// Contains a call or another expression that may have side effects.
    SideEffect,
    /// Uses syntax predicates do not support.
    Unsupported,
}

/// One branch of a recognized conditional.
#[derive(Debug)]
pub struct BranchMatch<'e> {
    /// The predicate as written.
    pub test: &'e Expr,
    /// The converted predicate.
    pub predicate: Result<GenExpr, PredicateIssue>,
    /// The expression rendered when the predicate holds.
    pub body: &'e Expr,
}

/// A recognized conditional, with else-if chains flattened.
#[derive(Debug)]
pub struct ConditionMatch<'e> {
    pub branches: Vec<BranchMatch<'e>>,
    pub otherwise: Option<&'e Expr>,
    pub span: SyntaxSpan,
}

impl<'e> ConditionMatch<'e> {
    /// The first predicate that failed to convert, side effects first.
    pub fn issue(&self) -> Option<(PredicateIssue, &'e Expr)> {
        let failed = |kind| {
            self.branches
                .iter()
                .find(|b| b.predicate.as_ref().err() == Some(&kind))
                .map(|b| (kind, b.test))
        };
        failed(PredicateIssue::SideEffect).or_else(|| failed(PredicateIssue::Unsupported))
    }
}

/// Whether an expression renders nothing (`null`, `undefined`, booleans).
pub fn is_empty_expr(expr: &Expr) -> bool {
    match unwrap_expr(expr) {
        Expr::Lit(Lit::Null(_) | Lit::Bool(_)) => true,
        Expr::Ident(ident) => &*ident.sym == "undefined",
        Expr::Unary(unary) => unary.op == UnaryOp::Void,
        _ => false,
    }
}

/// Match a short-circuit guard or a (chained) ternary.
pub fn detect_condition<'e>(ctx: &AnalysisContext, expr: &'e Expr) -> Option<ConditionMatch<'e>> {
    let expr = unwrap_expr(expr);
    let branch = |test: &'e Expr, body: &'e Expr| BranchMatch {
        test,
        predicate: to_predicate(ctx, test),
        body,
    };
    match expr {
        Expr::Bin(bin) if bin.op == BinaryOp::LogicalAnd => Some(ConditionMatch {
            branches: vec![branch(&*bin.left, &*bin.right)],
            otherwise: None,
            span: expr.span(),
        }),
        Expr::Cond(_) => {
            let mut branches = Vec::new();
            let mut current = expr;
            let otherwise = loop {
                match current {
                    Expr::Cond(cond) => {
                        branches.push(branch(&*cond.test, &*cond.cons));
                        current = unwrap_expr(&cond.alt);
                    }
                    other if is_empty_expr(other) => break None,
                    other => break Some(other),
                }
            };
            Some(ConditionMatch {
                branches,
                otherwise,
                span: expr.span(),
            })
        }
        _ => None,
    }
}

/// Convert a predicate expression.
pub fn to_predicate(ctx: &AnalysisContext, expr: &Expr) -> Result<GenExpr, PredicateIssue> {
    if has_side_effect(expr) {
        return Err(PredicateIssue::SideEffect);
    }
    convert(ctx, expr).ok_or(PredicateIssue::Unsupported)
}

fn convert(ctx: &AnalysisContext, expr: &Expr) -> Option<GenExpr> {
    let expr = unwrap_expr(expr);
    if let Some(path) = to_path(ctx, expr) {
        return Some(GenExpr::Path(path));
    }
    if let Some(lit) = to_literal(expr) {
        return Some(GenExpr::Literal(lit));
    }
    match expr {
        Expr::Unary(unary) if unary.op == UnaryOp::Bang => {
            Some(GenExpr::Not(Box::new(convert(ctx, &unary.arg)?)))
        }
        Expr::Bin(bin) => {
            let left = convert(ctx, &bin.left)?;
            let right = convert(ctx, &bin.right)?;
            let op = match bin.op {
                BinaryOp::LogicalAnd => return Some(GenExpr::And(Box::new(left), Box::new(right))),
                BinaryOp::LogicalOr => return Some(GenExpr::Or(Box::new(left), Box::new(right))),
                BinaryOp::EqEq | BinaryOp::EqEqEq => CompareOp::Eq,
                BinaryOp::NotEq | BinaryOp::NotEqEq => CompareOp::Ne,
                BinaryOp::Lt => CompareOp::Lt,
                BinaryOp::LtEq => CompareOp::Le,
                BinaryOp::Gt => CompareOp::Gt,
                BinaryOp::GtEq => CompareOp::Ge,
                _ => return None,
            };
            Some(GenExpr::compare(op, left, right))
        }
        _ => None,
    }
}

/// Whether evaluating an expression could run user code or mutate state.
pub fn has_side_effect(expr: &Expr) -> bool {
    match expr {
        Expr::Call(_)
        | Expr::New(_)
        | Expr::Assign(_)
        | Expr::Update(_)
        | Expr::Await(_)
        | Expr::Yield(_)
        | Expr::TaggedTpl(_) => true,
        Expr::Unary(unary) => unary.op == UnaryOp::Delete || has_side_effect(&unary.arg),
        Expr::Bin(bin) => has_side_effect(&bin.left) || has_side_effect(&bin.right),
        Expr::Cond(cond) => {
            has_side_effect(&cond.test) || has_side_effect(&cond.cons) || has_side_effect(&cond.alt)
        }
        Expr::Paren(paren) => has_side_effect(&paren.expr),
        Expr::Seq(seq) => seq.exprs.iter().any(|e| has_side_effect(e)),
        Expr::Member(member) => has_side_effect(&member.obj),
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => has_side_effect(&member.obj),
            OptChainBase::Call(_) => true,
        },
        Expr::Tpl(tpl) => tpl.exprs.iter().any(|e| has_side_effect(e)),
        Expr::TsAs(e) => has_side_effect(&e.expr),
        Expr::TsNonNull(e) => has_side_effect(&e.expr),
        Expr::TsSatisfies(e) => has_side_effect(&e.expr),
        _ => false,
    }
}
