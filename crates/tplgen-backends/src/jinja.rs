//! Jinja2 backend.
//!
//! Autoescaping is assumed on; raw variables use `|safe`. Missing data falls
//! back through `|default(...)`. Slots are read from `slots.<name>`.
//!
//! `{% if %}` uses Python truthiness: empty lists and dicts are falsy, where
//! the host treats every array and object as truthy.

use crate::backend::{Backend, Features};
use crate::context::EmitContext;
use crate::error::EmitResult;
use crate::syntax::{
    guard_edges, is_identifier, protect, render_html_element, slot_path, template_file,
    InfixSyntax, PathSyntax,
};
use tplgen_ir::html::escape_text;
use tplgen_ir::{
    quote, CompareOp, GenBlock, GenCondition, GenElement, GenExtends, GenInclude, GenLoop, GenPath,
    GenSlot, GenText, GenVariable, NodeKind, PropValue,
};

/// The Jinja2 backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jinja;

const FILTERS: &[(&str, &str)] = &[
    ("currency", "\"${:,.2f}\".format({value})"),
    ("upper", "{value}|upper"),
    ("lower", "{value}|lower"),
    ("capitalize", "{value}|capitalize"),
    ("trim", "{value}|trim"),
    ("json", "{value}|tojson"),
];

const EXPR: InfixSyntax = InfixSyntax {
    and: " and ",
    or: " or ",
    not: "not ",
    null: "none",
    quote: '"',
    compare: CompareOp::symbol,
};

fn index(i: u32) -> String {
    format!("[{}]", i)
}

fn quoted_key(key: &str) -> String {
    format!("[{}]", quote(key, '"'))
}

const PATH: PathSyntax = PathSyntax {
    index,
    quoted_key,
    length: "|length",
};

fn escape(text: &str) -> String {
    protect(&guard_edges(text), &["{{", "{%", "{#"], "{% raw %}", "{% endraw %}")
}

impl Jinja {
    fn path(&self, path: &GenPath) -> String {
        PATH.spell(path)
    }

    fn value(&self, var: &GenVariable, ctx: &EmitContext) -> EmitResult<String> {
        let mut value = self.path(&var.path);
        if let Some(default) = &var.default {
            value = format!("{}|default({})", value, EXPR.literal(default));
        }
        if let Some(filter) = &var.filter {
            value = self.apply_filter(filter, &value).ok_or_else(|| {
                ctx.unsupported(
                    NodeKind::Variable,
                    &var.location,
                    format!("no Jinja filter for `{}`", filter),
                )
            })?;
        }
        if var.raw {
            value.push_str("|safe");
        }
        Ok(value)
    }
}

impl Backend for Jinja {
    fn id(&self) -> &'static str {
        "jinja"
    }

    fn extension(&self) -> &'static str {
        "jinja"
    }

    fn features(&self) -> Features {
        Features::RAW_OUTPUT
            | Features::NAMED_FILTERS
            | Features::BLOCK_INHERITANCE
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
        ctx.push_str("{% for ");
        ctx.push_str(&l.item);
        ctx.push_str(" in ");
        ctx.push_mapped(&self.path(&l.iterable), &l.location);
        ctx.push_str(" %}");
        if let Some(index) = &l.index {
            ctx.push_str("{% set ");
            ctx.push_str(index);
            ctx.push_str(" = loop.index0 %}");
        }

        let marker = ctx.enter_loop(std::iter::once(&l.item).chain(&l.index));
        self.render_children(&l.body, ctx)?;
        ctx.exit_loop(marker);

        ctx.push_str("{% endfor %}");
        Ok(())
    }

    fn render_condition(&self, cond: &GenCondition, ctx: &mut EmitContext) -> EmitResult {
        for (i, branch) in cond.branches.iter().enumerate() {
            ctx.push_str(if i == 0 { "{% if " } else { "{% elif " });
            let predicate = EXPR.expr(&branch.predicate, &|p: &GenPath| self.path(p));
            ctx.push_mapped(&predicate, &branch.location);
            ctx.push_str(" %}");
            self.render_children(&branch.body, ctx)?;
        }
        if let Some(otherwise) = &cond.otherwise {
            ctx.push_str("{% else %}");
            self.render_children(otherwise, ctx)?;
        }
        ctx.push_str("{% endif %}");
        Ok(())
    }

    fn render_variable(&self, var: &GenVariable, ctx: &mut EmitContext) -> EmitResult {
        let value = self.value(var, ctx)?;
        ctx.push_str("{{ ");
        ctx.push_mapped(&value, &var.location);
        ctx.push_str(" }}");
        Ok(())
    }

    fn render_slot(&self, slot: &GenSlot, ctx: &mut EmitContext) -> EmitResult {
        let path = self.path(&slot_path(&slot.name));
        match &slot.default {
            None => {
                ctx.push_str("{{ ");
                ctx.push_mapped(&path, &slot.location);
                ctx.push_str("|safe }}");
            }
            Some(default) => {
                ctx.push_str("{% if ");
                ctx.push_mapped(&path, &slot.location);
                ctx.push_str(" %}{{ ");
                ctx.push_str(&path);
                ctx.push_str("|safe }}{% else %}");
                self.render_children(default, ctx)?;
                ctx.push_str("{% endif %}");
            }
        }
        Ok(())
    }

    fn render_include(&self, inc: &GenInclude, ctx: &mut EmitContext) -> EmitResult {
        let file = quote(&template_file(&inc.template, self.extension()), '"');
        if inc.props.is_empty() {
            ctx.push_str("{% include ");
            ctx.push_mapped(&file, &inc.location);
            ctx.push_str(" %}");
            return Ok(());
        }

        let mut bindings = Vec::with_capacity(inc.props.len());
        for (name, value) in &inc.props {
            if !is_identifier(name) {
                return Err(ctx.unsupported(
                    NodeKind::Include,
                    &inc.location,
                    format!("prop `{}` is not a valid Jinja name", name),
                ));
            }
            let value = match value {
                PropValue::Literal(lit) => EXPR.literal(lit),
                PropValue::Path(path) => self.path(path),
            };
            bindings.push(format!("{}={}", name, value));
        }
        ctx.push_str("{% with ");
        ctx.push_str(&bindings.join(", "));
        ctx.push_str(" %}{% include ");
        ctx.push_mapped(&file, &inc.location);
        ctx.push_str(" %}{% endwith %}");
        Ok(())
    }

    fn render_block(&self, block: &GenBlock, ctx: &mut EmitContext) -> EmitResult {
        if !is_identifier(&block.name) {
            return Err(ctx.unsupported(
                NodeKind::Block,
                &block.location,
                format!("block name `{}` is not a valid Jinja name", block.name),
            ));
        }
        ctx.push_str("{% block ");
        ctx.push_mapped(&block.name, &block.location);
        ctx.push_str(" %}");
        self.render_children(&block.body, ctx)?;
        ctx.push_str("{% endblock %}");
        Ok(())
    }

    fn render_extends(&self, ext: &GenExtends, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("{% extends ");
        ctx.push_mapped(
            &quote(&template_file(&ext.layout, self.extension()), '"'),
            &ext.location,
        );
        ctx.push_str(" %}");
        for block in &ext.blocks {
            ctx.line();
            self.render_block(block, ctx)?;
        }
        Ok(())
    }
}
