//! Loop detection: `items.map((item, i) => ...)`.

use super::paths::{as_member, to_path, unwrap_expr};
use crate::context::AnalysisContext;
use smol_str::SmolStr;
use tplgen_ir::GenPath;
use tplgen_parser::ast::{
    BlockStmt, BlockStmtOrExpr, Callee, Expr, ExprOrSpread, JSXAttrOrSpread, JSXAttrValue, JSXExpr,
    MemberProp, OptChainBase, Pat, Stmt,
};
use tplgen_parser::{Spanned, SyntaxSpan};

/// A recognized mapper loop.
#[derive(Debug)]
pub struct LoopMatch<'e> {
    /// The collection path.
    pub iterable: GenPath,
    /// First mapper parameter.
    pub item: SmolStr,
    /// Second mapper parameter, if declared.
    pub index: Option<SmolStr>,
    /// The expression the mapper returns.
    pub body: &'e Expr,
    pub span: SyntaxSpan,
}

/// Split a call into callee and arguments, looking through optional chaining.
fn as_call(expr: &Expr) -> Option<(&Expr, &[ExprOrSpread])> {
    match unwrap_expr(expr) {
        Expr::Call(call) => match &call.callee {
            Callee::Expr(callee) => Some((&**callee, call.args.as_slice())),
            _ => None,
        },
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Call(call) => Some((&*call.callee, call.args.as_slice())),
            OptChainBase::Member(_) => None,
        },
        _ => None,
    }
}

/// Whether an expression is a `.map(...)` call of any shape.
pub fn is_map_call(expr: &Expr) -> bool {
    map_call(expr).is_some()
}

fn map_call(expr: &Expr) -> Option<(&Expr, &[ExprOrSpread])> {
    let (callee, args) = as_call(expr)?;
    let member = as_member(callee)?;
    match &member.prop {
        MemberProp::Ident(prop) if &*prop.sym == "map" => Some((&*member.obj, args)),
        _ => None,
    }
}

/// Match `path.map(cb)` / `path?.map(cb)` where `cb` is an arrow or function
/// expression with plain identifier parameters.
pub fn detect_loop<'e>(ctx: &AnalysisContext, expr: &'e Expr) -> Option<LoopMatch<'e>> {
    let (collection, args) = map_call(expr)?;
    let [callback] = args else {
        return None;
    };
    if callback.spread.is_some() {
        return None;
    }
    let iterable = to_path(ctx, collection)?;
    if iterable.is_length() {
        return None;
    }

    let (params, body): (Vec<&Pat>, &'e Expr) = match unwrap_expr(&callback.expr) {
        Expr::Arrow(arrow) => {
            let body = match &*arrow.body {
                BlockStmtOrExpr::Expr(body) => &**body,
                BlockStmtOrExpr::BlockStmt(block) => block_return(block)?,
            };
            (arrow.params.iter().collect(), body)
        }
        Expr::Fn(func) => {
            let body = block_return(func.function.body.as_ref()?)?;
            (func.function.params.iter().map(|p| &p.pat).collect(), body)
        }
        _ => return None,
    };

    let binding = |pat: &Pat| match pat {
        Pat::Ident(ident) => Some(SmolStr::new(&*ident.id.sym)),
        _ => None,
    };
    let (item, index) = match params.as_slice() {
        [item] => (binding(*item)?, None),
        [item, index] => (binding(*item)?, Some(binding(*index)?)),
        _ => return None,
    };

    Some(LoopMatch {
        iterable,
        item,
        index,
        body,
        span: unwrap_expr(expr).span(),
    })
}

/// The expression of a block's final `return`.
pub fn block_return(block: &BlockStmt) -> Option<&Expr> {
    match block.stmts.as_slice() {
        [.., Stmt::Return(ret)] => ret.arg.as_deref(),
        _ => None,
    }
}

/// The `key` of the element a loop body returns, when it is a path.
///
/// Must be called with the loop bindings in scope.
pub fn detect_key(ctx: &AnalysisContext, body: &Expr) -> Option<GenPath> {
    let Expr::JSXElement(el) = unwrap_expr(body) else {
        return None;
    };
    el.opening.attrs.iter().find_map(|attr| {
        let JSXAttrOrSpread::JSXAttr(attr) = attr else {
            return None;
        };
        if ctx.text(attr.name.span()) != "key" {
            return None;
        }
        match attr.value.as_ref()? {
            JSXAttrValue::JSXExprContainer(container) => match &container.expr {
                JSXExpr::Expr(expr) => to_path(ctx, expr),
                JSXExpr::JSXEmptyExpr(_) => None,
            },
            _ => None,
        }
    })
}
