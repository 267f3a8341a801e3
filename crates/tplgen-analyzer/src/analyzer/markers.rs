//! Reserved marker elements: `<Slot>`, `<Include>`, `<Block>`, `<Extends>`.

use super::attrs::{attr_name, attr_value, string_attr, AttrValueRef};
use super::paths::{to_literal, to_path};
use crate::context::AnalysisContext;
use crate::diagnostics::WarningCode;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tplgen_ir::{Literal, PropValue};
use tplgen_parser::ast::{JSXAttrOrSpread, JSXElement, JSXElementChild};
use tplgen_parser::Spanned;

pub const SLOT_MARKER: &str = "Slot";
pub const INCLUDE_MARKER: &str = "Include";
pub const BLOCK_MARKER: &str = "Block";
pub const EXTENDS_MARKER: &str = "Extends";

/// Names with DSL meaning. They must not be used for unrelated elements or functions.
pub const RESERVED_NAMES: &[&str] = &[
    SLOT_MARKER,
    INCLUDE_MARKER,
    BLOCK_MARKER,
    EXTENDS_MARKER,
    super::variables::FILTER_MARKER,
    super::variables::RAW_MARKER,
];

/// Check if a name is reserved by the DSL.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// The tag name as written (`div`, `Card`, `ui.Button`).
pub fn element_name<'a>(ctx: &AnalysisContext<'a>, el: &JSXElement) -> &'a str {
    ctx.text(el.opening.name.span())
}

/// `<Slot name="x">default</Slot>`
#[derive(Debug)]
pub struct SlotMatch<'e> {
    pub name: SmolStr,
    pub children: &'e [JSXElementChild],
}

/// `<Include template="card" title={item.title} />`
#[derive(Debug)]
pub struct IncludeMatch {
    pub template: SmolStr,
    pub props: IndexMap<SmolStr, PropValue>,
}

/// `<Block name="content">...</Block>`
#[derive(Debug)]
pub struct BlockMatch<'e> {
    pub name: SmolStr,
    pub children: &'e [JSXElementChild],
    pub element: &'e JSXElement,
}

/// `<Extends layout="base"><Block .../></Extends>`
#[derive(Debug)]
pub struct ExtendsMatch<'e> {
    pub layout: SmolStr,
    pub blocks: Vec<BlockMatch<'e>>,
}

fn malformed(ctx: &mut AnalysisContext, el: &JSXElement, marker: &str, attr: &str) {
    ctx.warn(
        WarningCode::MalformedMarker,
        format!("<{}> requires a `{}` attribute", marker, attr),
        el.opening.span,
    );
}

pub fn detect_slot<'e>(ctx: &AnalysisContext, el: &'e JSXElement) -> Option<SlotMatch<'e>> {
    if element_name(ctx, el) != SLOT_MARKER {
        return None;
    }
    let name = string_attr(ctx, el, "name").unwrap_or_else(|| "default".to_string());
    Some(SlotMatch {
        name: name.into(),
        children: &el.children,
    })
}

pub fn detect_include(ctx: &mut AnalysisContext, el: &JSXElement) -> Option<IncludeMatch> {
    if element_name(ctx, el) != INCLUDE_MARKER {
        return None;
    }
    let Some(template) = string_attr(ctx, el, "template") else {
        malformed(ctx, el, INCLUDE_MARKER, "template");
        return None;
    };

    let mut props = IndexMap::new();
    for attr in &el.opening.attrs {
        let attr = match attr {
            JSXAttrOrSpread::JSXAttr(attr) => attr,
            JSXAttrOrSpread::SpreadElement(spread) => {
                ctx.warn(
                    WarningCode::SpreadAttribute,
                    "spread props on <Include> are ignored",
                    spread.span(),
                );
                continue;
            }
        };
        let name = attr_name(ctx, attr);
        if name == "template" || name == "key" {
            continue;
        }
        let value = match attr_value(ctx, attr) {
            AttrValueRef::Flag => PropValue::Literal(Literal::Bool(true)),
            AttrValueRef::Literal(text) => PropValue::Literal(Literal::Str(text)),
            AttrValueRef::Expr(expr) => {
                if let Some(path) = to_path(ctx, expr) {
                    PropValue::Path(path)
                } else if let Some(lit) = to_literal(expr) {
                    PropValue::Literal(lit)
                } else {
                    ctx.warn(
                        WarningCode::UnsupportedAttribute,
                        format!("prop `{}` is neither a literal nor a path", name),
                        attr.span,
                    );
                    PropValue::Literal(Literal::Str(ctx.text(expr.span()).to_string()))
                }
            }
            AttrValueRef::Empty => continue,
            AttrValueRef::Element => {
                ctx.warn(
                    WarningCode::UnsupportedAttribute,
                    format!("prop `{}` cannot hold markup", name),
                    attr.span,
                );
                continue;
            }
        };
        props.insert(SmolStr::new(name), value);
    }

    Some(IncludeMatch {
        template: template.into(),
        props,
    })
}

pub fn detect_block<'e>(ctx: &mut AnalysisContext, el: &'e JSXElement) -> Option<BlockMatch<'e>> {
    if element_name(ctx, el) != BLOCK_MARKER {
        return None;
    }
    let Some(name) = string_attr(ctx, el, "name") else {
        malformed(ctx, el, BLOCK_MARKER, "name");
        return None;
    };
    Some(BlockMatch {
        name: name.into(),
        children: &el.children,
        element: el,
    })
}

pub fn detect_extends<'e>(
    ctx: &mut AnalysisContext,
    el: &'e JSXElement,
) -> Option<ExtendsMatch<'e>> {
    if element_name(ctx, el) != EXTENDS_MARKER {
        return None;
    }
    let Some(layout) = string_attr(ctx, el, "layout") else {
        malformed(ctx, el, EXTENDS_MARKER, "layout");
        return None;
    };

    let mut blocks = Vec::new();
    for child in &el.children {
        match child {
            JSXElementChild::JSXText(text) if ctx.text(text.span).trim().is_empty() => {}
            JSXElementChild::JSXExprContainer(container)
                if matches!(container.expr, tplgen_parser::ast::JSXExpr::JSXEmptyExpr(_)) => {}
            JSXElementChild::JSXElement(child) if element_name(ctx, child) == BLOCK_MARKER => {
                if let Some(block) = detect_block(ctx, child) {
                    blocks.push(block);
                }
            }
            other => ctx.warn(
                WarningCode::DroppedContent,
                "only <Block> children are kept inside <Extends>",
                other.span(),
            ),
        }
    }

    Some(ExtendsMatch {
        layout: layout.into(),
        blocks,
    })
}
