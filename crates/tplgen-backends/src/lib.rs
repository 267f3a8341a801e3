//! Template backends.
//!
//! Each backend renders a [`GenRoot`] into one target template language. A
//! backend is stateless: every call to [`emit`] owns a fresh
//! [`EmitContext`], so any number of (component, backend) pairs can be
//! emitted concurrently.

pub mod backend;
pub mod context;
pub mod error;
pub mod handlebars;
pub mod jinja;
pub mod liquid;
pub mod native;
pub mod registry;
pub mod syntax;
pub mod twig;

use source_map::SourceMap;
use tplgen_ir::{walk, GenNode, GenRoot};

pub use backend::{is_block_layout, Backend, Features, CANONICAL_FILTERS, FILTER_VALUE};
pub use context::EmitContext;
pub use error::{EmitResult, RegistryError, UnsupportedFeatureError};
pub use handlebars::Handlebars;
pub use jinja::Jinja;
pub use liquid::Liquid;
pub use native::{Native, RUNTIME_MODULE};
pub use registry::BackendRegistry;
pub use twig::Twig;

/// One emitted template.
#[derive(Debug, Clone)]
pub struct EmitOutput {
    /// The generated template text, ending with a newline.
    pub code: String,
    /// Mappings from generated offsets back to the component source.
    pub source_map: SourceMap,
    /// `<Component>.<ext>`
    pub file_name: String,
}

/// Emit one component with one backend.
pub fn emit(root: &GenRoot, backend: &dyn Backend) -> Result<EmitOutput, UnsupportedFeatureError> {
    let _span = tracing::debug_span!("emit", component = %root.name, backend = backend.id()).entered();

    let mut ctx = EmitContext::new(backend.id());
    if !backend.features().contains(Features::BLOCK_INHERITANCE) {
        check_inheritance(root, &ctx)?;
    }

    backend.render_root(root, &mut ctx)?;
    let (mut code, source_map) = ctx.finish();
    if !code.ends_with('\n') {
        code.push('\n');
    }

    tracing::debug!(bytes = code.len(), mappings = source_map.len(), "emitted");
    Ok(EmitOutput {
        code,
        source_map,
        file_name: format!("{}.{}", root.name, backend.extension()),
    })
}

/// Reject the first inheritance node before anything is written.
fn check_inheritance(root: &GenRoot, ctx: &EmitContext) -> EmitResult {
    let mut first = None;
    walk(&root.children, &mut |node| {
        if first.is_none() && matches!(node, GenNode::Block(_) | GenNode::Extends(_)) {
            first = Some(node);
        }
    });
    match first {
        Some(node) => Err(ctx.unsupported(
            node.kind(),
            node.location(),
            format!("`{}` has no template inheritance", ctx.backend()),
        )),
        None => Ok(()),
    }
}
