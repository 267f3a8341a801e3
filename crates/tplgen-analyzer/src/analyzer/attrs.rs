//! JSX attribute access.

use crate::context::AnalysisContext;
use tplgen_ir::html::decode_entities;
use tplgen_parser::ast::{Expr, JSXAttr, JSXAttrOrSpread, JSXAttrValue, JSXElement, JSXExpr};
use tplgen_parser::Spanned;

/// The value side of a JSX attribute.
#[derive(Debug)]
pub enum AttrValueRef<'e> {
    /// `disabled`
    Flag,
    /// `class="card"`, entities decoded.
    Literal(String),
    /// `class={expr}`
    Expr(&'e Expr),
    /// `class={}` or `class={/* comment */}`
    Empty,
    /// `icon=<Icon />`
    Element,
}

/// The attribute name as written.
pub fn attr_name<'a>(ctx: &AnalysisContext<'a>, attr: &JSXAttr) -> &'a str {
    ctx.text(attr.name.span())
}

/// Read an attribute value.
pub fn attr_value<'e>(ctx: &AnalysisContext, attr: &'e JSXAttr) -> AttrValueRef<'e> {
    match &attr.value {
        None => AttrValueRef::Flag,
        Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
            JSXExpr::Expr(expr) => AttrValueRef::Expr(&**expr),
            JSXExpr::JSXEmptyExpr(_) => AttrValueRef::Empty,
        },
        Some(JSXAttrValue::JSXElement(_)) | Some(JSXAttrValue::JSXFragment(_)) => {
            AttrValueRef::Element
        }
        Some(_) => {
            let text = ctx.text(attr.span);
            let value = text
                .split_once('=')
                .map(|(_, value)| value.trim())
                .unwrap_or_default();
            let inner = value.get(1..value.len().saturating_sub(1)).unwrap_or_default();
            AttrValueRef::Literal(decode_entities(inner))
        }
    }
}

/// The plain attributes of an element, skipping spreads.
pub fn attrs(el: &JSXElement) -> impl Iterator<Item = &JSXAttr> {
    el.opening.attrs.iter().filter_map(|attr| match attr {
        JSXAttrOrSpread::JSXAttr(attr) => Some(attr),
        JSXAttrOrSpread::SpreadElement(_) => None,
    })
}

/// Find an attribute by name.
pub fn find_attr<'e>(ctx: &AnalysisContext, el: &'e JSXElement, name: &str) -> Option<&'e JSXAttr> {
    attrs(el).find(|attr| attr_name(ctx, attr) == name)
}

/// A string-valued attribute: `name="x"` or `name={"x"}`.
pub fn string_attr(ctx: &AnalysisContext, el: &JSXElement, name: &str) -> Option<String> {
    let attr = find_attr(ctx, el, name)?;
    let value = match attr_value(ctx, attr) {
        AttrValueRef::Literal(value) => Some(value),
        AttrValueRef::Expr(expr) => match super::paths::to_literal(expr)? {
            tplgen_ir::Literal::Str(value) => Some(value),
            _ => None,
        },
        _ => None,
    };
    value.filter(|value| !value.is_empty())
}
