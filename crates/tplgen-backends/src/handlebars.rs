//! Handlebars backend.
//!
//! Predicates and filters are helper sub-expressions (`and`, `or`, `not`,
//! `eq`, `ne`, `lt`, `lte`, `gt`, `gte`, `default` and one helper per
//! canonical filter), which the host registers alongside the templates.
//! `{{#each}}` changes the context, so inside loops every path that is not a
//! block param is read through `@root`.
//!
//! `{{#if}}` treats an empty array as falsy, where the host treats every
//! array as truthy.

use crate::backend::{Backend, Features};
use crate::context::EmitContext;
use crate::error::EmitResult;
use crate::syntax::{guard_edges, render_html_element, slot_path, PathSyntax};
use tplgen_ir::html::escape_text;
use tplgen_ir::{
    format_number, quote, CompareOp, GenBlock, GenCondition, GenElement, GenExpr, GenExtends,
    GenInclude, GenLoop, GenPath, GenSlot, GenText, GenVariable, Literal, NodeKind, PropValue,
};

/// The Handlebars backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Handlebars;

const FILTERS: &[(&str, &str)] = &[
    ("currency", "(currency {value})"),
    ("upper", "(upper {value})"),
    ("lower", "(lower {value})"),
    ("capitalize", "(capitalize {value})"),
    ("trim", "(trim {value})"),
    ("json", "(json {value})"),
];

fn index(i: u32) -> String {
    format!(".[{}]", i)
}

fn quoted_key(key: &str) -> String {
    format!(".[{}]", key)
}

const PATH: PathSyntax = PathSyntax {
    index,
    quoted_key,
    length: ".length",
};

/// Backslashes become references: a literal `\` before a mustache escapes it.
fn escape(text: &str) -> String {
    guard_edges(&text.replace('\\', "&#92;")).replace("{{", "\\{{")
}

fn compare_helper(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "eq",
        CompareOp::Ne => "ne",
        CompareOp::Lt => "lt",
        CompareOp::Le => "lte",
        CompareOp::Gt => "gt",
        CompareOp::Ge => "gte",
    }
}

fn literal(lit: &Literal) -> String {
    match lit {
        Literal::Str(s) => quote(s, '"'),
        Literal::Num(n) => format_number(*n),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

/// A helper call at the top of a mustache drops its parentheses.
fn mustache(expr: &str) -> &str {
    expr.strip_prefix('(')
        .and_then(|e| e.strip_suffix(')'))
        .unwrap_or(expr)
}

/// Partial names with path separators or dots need the segment-literal form.
fn partial_name(name: &str) -> String {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        name.to_string()
    } else {
        format!("[{}]", name)
    }
}

impl Handlebars {
    fn path(&self, path: &GenPath, ctx: &EmitContext) -> String {
        let spelled = PATH.spell(path);
        if ctx.in_loop() && !ctx.is_local(path) {
            format!("@root.{}", spelled)
        } else {
            spelled
        }
    }

    fn predicate(&self, expr: &GenExpr, ctx: &EmitContext) -> String {
        match expr {
            GenExpr::Path(path) => self.path(path, ctx),
            GenExpr::Literal(lit) => literal(lit),
            GenExpr::Not(inner) => format!("(not {})", self.predicate(inner, ctx)),
            GenExpr::And(l, r) => format!(
                "(and {} {})",
                self.predicate(l, ctx),
                self.predicate(r, ctx)
            ),
            GenExpr::Or(l, r) => format!(
                "(or {} {})",
                self.predicate(l, ctx),
                self.predicate(r, ctx)
            ),
            GenExpr::Compare { op, left, right } => format!(
                "({} {} {})",
                compare_helper(*op),
                self.predicate(left, ctx),
                self.predicate(right, ctx)
            ),
        }
    }

    fn value(&self, var: &GenVariable, ctx: &EmitContext) -> EmitResult<String> {
        let mut value = self.path(&var.path, ctx);
        if let Some(default) = &var.default {
            value = format!("(default {} {})", value, literal(default));
        }
        if let Some(filter) = &var.filter {
            value = self.apply_filter(filter, &value).ok_or_else(|| {
                ctx.unsupported(
                    NodeKind::Variable,
                    &var.location,
                    format!("no Handlebars helper for filter `{}`", filter),
                )
            })?;
        }
        Ok(value)
    }
}

impl Backend for Handlebars {
    fn id(&self) -> &'static str {
        "handlebars"
    }

    fn extension(&self) -> &'static str {
        "hbs"
    }

    fn features(&self) -> Features {
        Features::RAW_OUTPUT
            | Features::NAMED_FILTERS
            | Features::INCLUDE_PROPS
            | Features::SLOTS
            | Features::LOOP_INDEX
    }

    fn filters(&self) -> &'static [(&'static str, &'static str)] {
        FILTERS
    }

    fn render_element(&self, el: &GenElement, ctx: &mut EmitContext) -> EmitResult {
        render_html_element(self, el, ctx, escape)
    }

    fn render_text(&self, text: &GenText, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str(&escape(&escape_text(&text.text)));
        Ok(())
    }

    fn render_loop(&self, l: &GenLoop, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("{{#each ");
        let iterable = self.path(&l.iterable, ctx);
        ctx.push_mapped(&iterable, &l.location);
        ctx.push_str(" as |");
        ctx.push_str(&l.item);
        if let Some(index) = &l.index {
            ctx.push_str(" ");
            ctx.push_str(index);
        }
        ctx.push_str("|}}");

        let marker = ctx.enter_loop(std::iter::once(&l.item).chain(&l.index));
        self.render_children(&l.body, ctx)?;
        ctx.exit_loop(marker);

        ctx.push_str("{{/each}}");
        Ok(())
    }

    fn render_condition(&self, cond: &GenCondition, ctx: &mut EmitContext) -> EmitResult {
        for (i, branch) in cond.branches.iter().enumerate() {
            ctx.push_str(if i == 0 { "{{#if " } else { "{{else if " });
            let predicate = self.predicate(&branch.predicate, ctx);
            ctx.push_mapped(&predicate, &branch.location);
            ctx.push_str("}}");
            self.render_children(&branch.body, ctx)?;
        }
        if let Some(otherwise) = &cond.otherwise {
            ctx.push_str("{{else}}");
            self.render_children(otherwise, ctx)?;
        }
        ctx.push_str("{{/if}}");
        Ok(())
    }

    fn render_variable(&self, var: &GenVariable, ctx: &mut EmitContext) -> EmitResult {
        let value = self.value(var, ctx)?;
        let (open, close) = if var.raw { ("{{{", "}}}") } else { ("{{", "}}") };
        ctx.push_str(open);
        ctx.push_mapped(mustache(&value), &var.location);
        ctx.push_str(close);
        Ok(())
    }

    fn render_slot(&self, slot: &GenSlot, ctx: &mut EmitContext) -> EmitResult {
        let path = self.path(&slot_path(&slot.name), ctx);
        let Some(default) = &slot.default else {
            ctx.push_str("{{{");
            ctx.push_mapped(&path, &slot.location);
            ctx.push_str("}}}");
            return Ok(());
        };
        ctx.push_str("{{#if ");
        ctx.push_mapped(&path, &slot.location);
        ctx.push_str("}}{{{");
        ctx.push_str(&path);
        ctx.push_str("}}}{{else}}");
        self.render_children(default, ctx)?;
        ctx.push_str("{{/if}}");
        Ok(())
    }

    fn render_include(&self, inc: &GenInclude, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("{{> ");
        ctx.push_mapped(&partial_name(&inc.template), &inc.location);
        for (name, value) in &inc.props {
            let value = match value {
                PropValue::Literal(lit) => literal(lit),
                PropValue::Path(path) => self.path(path, ctx),
            };
            ctx.push_str(" ");
            ctx.push_str(name);
            ctx.push_str("=");
            ctx.push_str(&value);
        }
        ctx.push_str("}}");
        Ok(())
    }

    fn render_block(&self, block: &GenBlock, ctx: &mut EmitContext) -> EmitResult {
        Err(ctx.unsupported(
            NodeKind::Block,
            &block.location,
            "Handlebars has no template inheritance",
        ))
    }

    fn render_extends(&self, ext: &GenExtends, ctx: &mut EmitContext) -> EmitResult {
        Err(ctx.unsupported(
            NodeKind::Extends,
            &ext.location,
            "Handlebars has no template inheritance",
        ))
    }
}
