//! Analysis context.

use crate::diagnostics::{AnalysisWarning, WarningCode};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::Location;
use tplgen_ir::{GenPath, Literal, PathSegment};
use tplgen_parser::{ParsedComponentFile, SyntaxSpan};

/// How a component receives its props.
#[derive(Debug, Clone, Default)]
pub struct PropsBinding {
    /// `function Card(props)`: paths rooted at `props` drop the prefix.
    pub prefix: Option<SmolStr>,
    /// `{ title: heading }`: local name → prop name.
    pub aliases: FxHashMap<SmolStr, SmolStr>,
    /// `{ price = 0 }`: prop name → default.
    pub defaults: FxHashMap<SmolStr, Literal>,
}

/// State carried while analyzing one component.
pub struct AnalysisContext<'a> {
    file: &'a ParsedComponentFile,
    /// Props of the component being built.
    pub props: PropsBinding,
    /// Loop bindings in scope, innermost last.
    pub scope_vars: Vec<SmolStr>,
    /// Warnings raised so far.
    pub warnings: Vec<AnalysisWarning>,
}

impl<'a> AnalysisContext<'a> {
    /// Create a context for a file.
    pub fn new(file: &'a ParsedComponentFile) -> Self {
        Self {
            file,
            props: PropsBinding::default(),
            scope_vars: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// The file being analyzed.
    pub fn file(&self) -> &'a ParsedComponentFile {
        self.file
    }

    /// Source text of a node.
    pub fn text(&self, span: SyntaxSpan) -> &'a str {
        self.file.text(span)
    }

    /// Location of a node.
    pub fn location(&self, span: SyntaxSpan) -> Location {
        self.file.location(span)
    }

    /// Record a warning.
    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>, span: SyntaxSpan) {
        let warning = AnalysisWarning::new(message, self.location(span), code);
        tracing::debug!(code = %code, location = %warning.location, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Add a loop binding.
    pub fn add_scope_var(&mut self, name: SmolStr) {
        self.scope_vars.push(name);
    }

    /// Check if a name is bound by an enclosing loop.
    pub fn has_scope_var(&self, name: &str) -> bool {
        self.scope_vars.iter().any(|v| v == name)
    }

    /// Enter a new scope.
    pub fn enter_scope(&mut self) -> usize {
        self.scope_vars.len()
    }

    /// Exit a scope, removing bindings added since marker.
    pub fn exit_scope(&mut self, marker: usize) {
        self.scope_vars.truncate(marker);
    }

    /// Rewrite a source path into a data path: strip the props prefix and
    /// resolve destructuring aliases. Loop bindings are left alone.
    pub fn resolve_path(&self, path: GenPath) -> GenPath {
        let Some(root) = path.root().map(SmolStr::new) else {
            return path;
        };
        if self.has_scope_var(&root) {
            return path;
        }
        if let Some(prefix) = &self.props.prefix {
            if let Some(stripped) = path.strip_root(prefix) {
                return stripped;
            }
        }
        if let Some(prop) = self.props.aliases.get(&root) {
            let mut segments = path.segments;
            segments[0] = PathSegment::Key(prop.clone());
            return GenPath::new(segments);
        }
        path
    }

    /// Destructuring default for a data path naming a whole prop.
    pub fn prop_default(&self, path: &GenPath) -> Option<Literal> {
        match path.segments.as_slice() {
            [PathSegment::Key(name)] if !self.has_scope_var(name) => {
                self.props.defaults.get(name).cloned()
            }
            _ => None,
        }
    }
}
