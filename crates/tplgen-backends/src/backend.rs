//! The backend contract.

use crate::context::EmitContext;
use crate::error::EmitResult;
use bitflags::bitflags;
use tplgen_ir::{
    GenBlock, GenCondition, GenElement, GenExtends, GenInclude, GenLoop, GenNode, GenRoot,
    GenSlot, GenText, GenVariable,
};

bitflags! {
    /// Capabilities a backend declares.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u16 {
        /// Unescaped output of a variable.
        const RAW_OUTPUT        = 1 << 0;
        /// Canonical filters map to native syntax.
        const NAMED_FILTERS     = 1 << 1;
        /// `GenBlock` / `GenExtends`.
        const BLOCK_INHERITANCE = 1 << 2;
        /// Includes receive prop bindings.
        const INCLUDE_PROPS     = 1 << 3;
        const SLOTS             = 1 << 4;
        /// Loops expose the iteration index.
        const LOOP_INDEX        = 1 << 5;
        /// Loop keys survive into the output.
        const KEYED_LOOPS       = 1 << 6;
    }
}

impl Features {
    /// Names of the set flags, for display.
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// Canonical filter names every built-in backend maps.
pub const CANONICAL_FILTERS: &[&str] = &["currency", "upper", "lower", "capitalize", "trim", "json"];

/// Placeholder for the filtered value in a filter's native syntax.
pub const FILTER_VALUE: &str = "{value}";

/// One target template language.
///
/// A backend is a stateless visitor over the IR: every `render_*` method
/// writes its node into the [`EmitContext`] of the emission in progress.
/// [`render`](Backend::render) dispatches on the closed node set, so a new
/// node kind is a compile error in every backend until handled.
pub trait Backend: Send + Sync {
    /// Identifier used on the command line and in diagnostics.
    fn id(&self) -> &'static str;

    /// File extension of emitted templates, without the leading dot.
    fn extension(&self) -> &'static str;

    /// Capability flags.
    fn features(&self) -> Features;

    /// Canonical filter name → native syntax, with [`FILTER_VALUE`] standing
    /// for the filtered expression.
    fn filters(&self) -> &'static [(&'static str, &'static str)];

    /// Apply a filter to an expression in native syntax.
    fn apply_filter(&self, name: &str, value: &str) -> Option<String> {
        self.filters()
            .iter()
            .find(|(canonical, _)| *canonical == name)
            .map(|(_, syntax)| syntax.replace(FILTER_VALUE, value))
    }

    /// Render a whole component. Top-level structural nodes go one per line.
    fn render_root(&self, root: &GenRoot, ctx: &mut EmitContext) -> EmitResult {
        let block = is_block_layout(&root.children);
        for (i, node) in root.children.iter().enumerate() {
            if block && i > 0 {
                ctx.line();
            }
            self.render(node, ctx)?;
        }
        Ok(())
    }

    /// Render one node.
    fn render(&self, node: &GenNode, ctx: &mut EmitContext) -> EmitResult {
        match node {
            GenNode::Element(el) => self.render_element(el, ctx),
            GenNode::Text(text) => self.render_text(text, ctx),
            GenNode::Loop(l) => self.render_loop(l, ctx),
            GenNode::Condition(cond) => self.render_condition(cond, ctx),
            GenNode::Variable(var) => self.render_variable(var, ctx),
            GenNode::Slot(slot) => self.render_slot(slot, ctx),
            GenNode::Include(inc) => self.render_include(inc, ctx),
            GenNode::Block(block) => self.render_block(block, ctx),
            GenNode::Extends(ext) => self.render_extends(ext, ctx),
        }
    }

    /// Render a child list. Lists made only of structural nodes go one per
    /// line; anything with text stays inline.
    fn render_children(&self, nodes: &[GenNode], ctx: &mut EmitContext) -> EmitResult {
        if is_block_layout(nodes) {
            ctx.indent();
            for node in nodes {
                ctx.line();
                self.render(node, ctx)?;
            }
            ctx.dedent();
            ctx.line();
        } else {
            for node in nodes {
                self.render(node, ctx)?;
            }
        }
        Ok(())
    }

    fn render_element(&self, el: &GenElement, ctx: &mut EmitContext) -> EmitResult;
    fn render_text(&self, text: &GenText, ctx: &mut EmitContext) -> EmitResult;
    fn render_loop(&self, l: &GenLoop, ctx: &mut EmitContext) -> EmitResult;
    fn render_condition(&self, cond: &GenCondition, ctx: &mut EmitContext) -> EmitResult;
    fn render_variable(&self, var: &GenVariable, ctx: &mut EmitContext) -> EmitResult;
    fn render_slot(&self, slot: &GenSlot, ctx: &mut EmitContext) -> EmitResult;
    fn render_include(&self, inc: &GenInclude, ctx: &mut EmitContext) -> EmitResult;
    fn render_block(&self, block: &GenBlock, ctx: &mut EmitContext) -> EmitResult;
    fn render_extends(&self, ext: &GenExtends, ctx: &mut EmitContext) -> EmitResult;
}

/// Whether a child list is laid out one node per line.
pub fn is_block_layout(nodes: &[GenNode]) -> bool {
    !nodes.is_empty()
        && nodes
            .iter()
            .all(|node| !matches!(node, GenNode::Text(_) | GenNode::Variable(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_feature_names() {
        let features = Features::RAW_OUTPUT | Features::SLOTS;
        assert_eq!(features.names(), vec!["RAW_OUTPUT", "SLOTS"]);
        assert!(!features.contains(Features::BLOCK_INHERITANCE));
    }
}
