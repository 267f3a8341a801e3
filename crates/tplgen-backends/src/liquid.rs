//! Liquid backend.
//!
//! Liquid has no parentheses and no `not`, and evaluates `and`/`or` from
//! right to left. Negations are pushed down to comparisons (`x == blank` for
//! a negated path) and same-operator chains are re-associated to the right;
//! a predicate that still needs grouping is rejected.
//!
//! Only `nil` and `false` are falsy in Liquid, so a bare path test accepts
//! `0` and `""`. A negated path compares against `blank`, which matches `""`
//! and empty arrays but not `0`. Both differ from host truthiness.

use crate::backend::{Backend, Features};
use crate::context::EmitContext;
use crate::error::EmitResult;
use crate::syntax::{guard_edges, is_atom, protect, render_html_element, slot_path, PathSyntax};
use tplgen_ir::html::escape_text;
use tplgen_ir::{
    format_number, quote, GenBlock, GenCondition, GenElement, GenExpr, GenExtends, GenInclude,
    GenLoop, GenPath, GenSlot, GenText, GenVariable, Literal, NodeKind, PropValue,
};

/// The Liquid backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Liquid;

const FILTERS: &[(&str, &str)] = &[
    ("currency", "{value} | money"),
    ("upper", "{value} | upcase"),
    ("lower", "{value} | downcase"),
    ("capitalize", "{value} | capitalize"),
    ("trim", "{value} | strip"),
    ("json", "{value} | json"),
];

fn index(i: u32) -> String {
    format!("[{}]", i)
}

fn quoted_key(key: &str) -> String {
    format!("[{}]", quote(key, '\''))
}

const PATH: PathSyntax = PathSyntax {
    index,
    quoted_key,
    length: ".size",
};

fn escape(text: &str) -> String {
    protect(&guard_edges(text), &["{{", "{%"], "{% raw %}", "{% endraw %}")
}

fn literal(lit: &Literal) -> String {
    match lit {
        Literal::Str(s) => quote(s, '\''),
        Literal::Num(n) => format_number(*n),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "nil".to_string(),
    }
}

/// Truthiness of a literal under host-runtime rules.
fn truthy(lit: &Literal) -> bool {
    match lit {
        Literal::Str(s) => !s.is_empty(),
        Literal::Num(n) => *n != 0.0 && !n.is_nan(),
        Literal::Bool(b) => *b,
        Literal::Null => false,
    }
}

fn is_logical(expr: &GenExpr) -> bool {
    matches!(expr, GenExpr::And(..) | GenExpr::Or(..))
}

impl Liquid {
    fn path(&self, path: &GenPath) -> String {
        PATH.spell(path)
    }

    /// Spell a predicate, or explain why Liquid cannot.
    fn predicate(&self, expr: &GenExpr) -> Result<String, &'static str> {
        match expr {
            GenExpr::Path(path) => Ok(self.path(path)),
            GenExpr::Literal(lit) => Ok(literal(lit)),
            GenExpr::Not(inner) => self.negation(inner),
            GenExpr::And(l, r) | GenExpr::Or(l, r) => {
                let and = matches!(expr, GenExpr::And(..));
                let rebuild = |a: GenExpr, b: GenExpr| {
                    if and {
                        GenExpr::And(Box::new(a), Box::new(b))
                    } else {
                        GenExpr::Or(Box::new(a), Box::new(b))
                    }
                };
                match &**l {
                    GenExpr::And(a, b) | GenExpr::Or(a, b)
                        if matches!(**l, GenExpr::And(..)) == and =>
                    {
                        let inner = rebuild((**b).clone(), (**r).clone());
                        self.predicate(&rebuild((**a).clone(), inner))
                    }
                    left if is_logical(left) => {
                        Err("mixes `and` and `or` in an order Liquid cannot group")
                    }
                    left => Ok(format!(
                        "{}{}{}",
                        self.predicate(left)?,
                        if and { " and " } else { " or " },
                        self.predicate(r)?
                    )),
                }
            }
            GenExpr::Compare { op, left, right } => {
                if !is_atom(left) || !is_atom(right) {
                    return Err("compares a compound expression");
                }
                Ok(format!(
                    "{} {} {}",
                    self.predicate(left)?,
                    op.symbol(),
                    self.predicate(right)?
                ))
            }
        }
    }

    fn negation(&self, inner: &GenExpr) -> Result<String, &'static str> {
        match inner {
            GenExpr::Path(path) => Ok(format!("{} == blank", self.path(path))),
            GenExpr::Literal(lit) => Ok((!truthy(lit)).to_string()),
            GenExpr::Not(expr) => self.predicate(expr),
            GenExpr::And(a, b) => self.predicate(&GenExpr::Or(
                Box::new(GenExpr::Not(a.clone())),
                Box::new(GenExpr::Not(b.clone())),
            )),
            GenExpr::Or(a, b) => self.predicate(&GenExpr::And(
                Box::new(GenExpr::Not(a.clone())),
                Box::new(GenExpr::Not(b.clone())),
            )),
            GenExpr::Compare { op, left, right } => self.predicate(&GenExpr::Compare {
                op: op.negate(),
                left: left.clone(),
                right: right.clone(),
            }),
        }
    }

    fn value(&self, var: &GenVariable, ctx: &EmitContext) -> EmitResult<String> {
        let mut value = self.path(&var.path);
        if let Some(default) = &var.default {
            value = format!("{} | default: {}", value, literal(default));
        }
        if let Some(filter) = &var.filter {
            value = self.apply_filter(filter, &value).ok_or_else(|| {
                ctx.unsupported(
                    NodeKind::Variable,
                    &var.location,
                    format!("no Liquid filter for `{}`", filter),
                )
            })?;
        }
        if !var.raw {
            value.push_str(" | escape");
        }
        Ok(value)
    }
}

impl Backend for Liquid {
    fn id(&self) -> &'static str {
        "liquid"
    }

    fn extension(&self) -> &'static str {
        "liquid"
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
        ctx.push_str("{% for ");
        ctx.push_str(&l.item);
        ctx.push_str(" in ");
        ctx.push_mapped(&self.path(&l.iterable), &l.location);
        ctx.push_str(" %}");
        if let Some(index) = &l.index {
            ctx.push_str("{% assign ");
            ctx.push_str(index);
            ctx.push_str(" = forloop.index0 %}");
        }

        let marker = ctx.enter_loop(std::iter::once(&l.item).chain(&l.index));
        self.render_children(&l.body, ctx)?;
        ctx.exit_loop(marker);

        ctx.push_str("{% endfor %}");
        Ok(())
    }

    fn render_condition(&self, cond: &GenCondition, ctx: &mut EmitContext) -> EmitResult {
        for (i, branch) in cond.branches.iter().enumerate() {
            let predicate = self.predicate(&branch.predicate).map_err(|reason| {
                ctx.unsupported(
                    NodeKind::Condition,
                    &branch.location,
                    format!("`{}` {}", branch.predicate, reason),
                )
            })?;
            ctx.push_str(if i == 0 { "{% if " } else { "{% elsif " });
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
        let Some(default) = &slot.default else {
            ctx.push_str("{{ ");
            ctx.push_mapped(&path, &slot.location);
            ctx.push_str(" }}");
            return Ok(());
        };
        ctx.push_str("{% if ");
        ctx.push_mapped(&path, &slot.location);
        ctx.push_str(" %}{{ ");
        ctx.push_str(&path);
        ctx.push_str(" }}{% else %}");
        self.render_children(default, ctx)?;
        ctx.push_str("{% endif %}");
        Ok(())
    }

    fn render_include(&self, inc: &GenInclude, ctx: &mut EmitContext) -> EmitResult {
        ctx.push_str("{% render ");
        ctx.push_mapped(&quote(&inc.template, '\''), &inc.location);
        for (name, value) in &inc.props {
            let value = match value {
                PropValue::Literal(lit) => literal(lit),
                PropValue::Path(path) => self.path(path),
            };
            ctx.push_str(", ");
            ctx.push_str(name);
            ctx.push_str(": ");
            ctx.push_str(&value);
        }
        ctx.push_str(" %}");
        Ok(())
    }

    fn render_block(&self, block: &GenBlock, ctx: &mut EmitContext) -> EmitResult {
        Err(ctx.unsupported(
            NodeKind::Block,
            &block.location,
            "Liquid has no template inheritance",
        ))
    }

    fn render_extends(&self, ext: &GenExtends, ctx: &mut EmitContext) -> EmitResult {
        Err(ctx.unsupported(
            NodeKind::Extends,
            &ext.location,
            "Liquid has no template inheritance",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tplgen_ir::CompareOp;

    fn path(s: &str) -> GenExpr {
        GenExpr::Path(GenPath::parse(s))
    }

    fn not(e: GenExpr) -> GenExpr {
        GenExpr::Not(Box::new(e))
    }

    fn and(a: GenExpr, b: GenExpr) -> GenExpr {
        GenExpr::And(Box::new(a), Box::new(b))
    }

    fn or(a: GenExpr, b: GenExpr) -> GenExpr {
        GenExpr::Or(Box::new(a), Box::new(b))
    }

    #[test]
    fn test_negation_pushed_down() {
        let liquid = Liquid;
        assert_eq!(liquid.predicate(&not(path("user"))).unwrap(), "user == blank");
        assert_eq!(
            liquid.predicate(&not(and(path("a"), path("b")))).unwrap(),
            "a == blank or b == blank"
        );
        let gt = GenExpr::compare(
            CompareOp::Gt,
            path("items.length"),
            GenExpr::Literal(Literal::Num(0.0)),
        );
        assert_eq!(liquid.predicate(&not(gt)).unwrap(), "items.size <= 0");
    }

    #[test]
    fn test_right_association() {
        let liquid = Liquid;
        let chain = and(and(path("a"), path("b")), path("c"));
        assert_eq!(liquid.predicate(&chain).unwrap(), "a and b and c");

        let right = and(path("a"), or(path("b"), path("c")));
        assert_eq!(liquid.predicate(&right).unwrap(), "a and b or c");

        let left = or(and(path("a"), path("b")), path("c"));
        assert!(liquid.predicate(&left).is_err());
    }
}
