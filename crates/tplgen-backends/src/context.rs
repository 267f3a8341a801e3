//! Emission context.

use crate::error::UnsupportedFeatureError;
use smol_str::SmolStr;
use source_map::{CodeBuilder, Location, SourceMap};
use tplgen_ir::{GenPath, NodeKind};

/// State of one emission: the output buffer and the bindings in scope.
///
/// A context lives for exactly one (component, backend) pair.
#[derive(Debug)]
pub struct EmitContext {
    builder: CodeBuilder,
    /// Id of the backend emitting.
    backend: SmolStr,
    /// Loop bindings in scope, innermost last.
    scope_vars: Vec<SmolStr>,
    /// Nesting depth of loops.
    loop_depth: usize,
    indent: usize,
}

impl EmitContext {
    /// Create a new context for `backend`.
    pub fn new(backend: impl Into<SmolStr>) -> Self {
        Self {
            builder: CodeBuilder::new(),
            backend: backend.into(),
            scope_vars: Vec::new(),
            loop_depth: 0,
            indent: 0,
        }
    }

    /// The id of the backend emitting.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Append code without mapping.
    pub fn push_str(&mut self, code: &str) {
        self.builder.push_str(code);
    }

    /// Append code mapped back to the node at `location`.
    pub fn push_mapped(&mut self, code: &str, location: &Location) {
        self.builder.push_mapped(code, location.span);
    }

    /// Start a new line at the current indentation.
    pub fn line(&mut self) {
        self.builder.newline();
        for _ in 0..self.indent {
            self.builder.push_str("  ");
        }
    }

    /// Increase indentation.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease indentation.
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Get the code written so far.
    pub fn code(&self) -> &str {
        self.builder.code()
    }

    /// Enter a loop body, binding `vars`. Returns a marker for [`exit_loop`](Self::exit_loop).
    pub fn enter_loop<'v>(&mut self, vars: impl IntoIterator<Item = &'v SmolStr>) -> usize {
        let marker = self.scope_vars.len();
        self.scope_vars.extend(vars.into_iter().cloned());
        self.loop_depth += 1;
        marker
    }

    /// Exit a loop body, removing bindings added since the marker.
    pub fn exit_loop(&mut self, marker: usize) {
        self.scope_vars.truncate(marker);
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    /// Check if a name is bound by an enclosing loop.
    pub fn has_var(&self, name: &str) -> bool {
        self.scope_vars.iter().any(|v| v == name)
    }

    /// Whether a path reads a loop binding rather than the render data.
    pub fn is_local(&self, path: &GenPath) -> bool {
        path.root().is_some_and(|root| self.has_var(root))
    }

    /// Check if emitting inside a loop.
    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }

    /// Build the error for a node this backend cannot express.
    pub fn unsupported(
        &self,
        node_kind: NodeKind,
        location: &Location,
        reason: impl Into<String>,
    ) -> UnsupportedFeatureError {
        UnsupportedFeatureError {
            node_kind,
            backend: self.backend.clone(),
            location: location.clone(),
            reason: reason.into(),
        }
    }

    /// Consume the context and return the code and source map.
    pub fn finish(self) -> (String, SourceMap) {
        self.builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Span;

    #[test]
    fn test_scope() {
        let mut ctx = EmitContext::new("jinja");
        assert!(!ctx.in_loop());

        let item = SmolStr::new("item");
        let outer = ctx.enter_loop([&item]);
        assert!(ctx.in_loop());
        assert!(ctx.is_local(&GenPath::parse("item.name")));
        assert!(!ctx.is_local(&GenPath::parse("items")));

        ctx.exit_loop(outer);
        assert!(!ctx.has_var("item"));
        assert!(!ctx.in_loop());
    }

    #[test]
    fn test_indentation_and_mapping() {
        let mut ctx = EmitContext::new("twig");
        let location = Location {
            span: Span::new(4, 9),
            ..Default::default()
        };
        ctx.push_str("<ul>");
        ctx.indent();
        ctx.line();
        ctx.push_mapped("{{ x }}", &location);
        ctx.dedent();
        ctx.line();
        ctx.push_str("</ul>");

        let (code, map) = ctx.finish();
        assert_eq!(code, "<ul>\n  {{ x }}\n</ul>");
        assert_eq!(map.find_source(8), Some(Span::new(4, 9)));
    }
}
