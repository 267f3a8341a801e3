//! Expression analyzer and IR builder.
//!
//! Turns a parsed component file into one [`GenRoot`](tplgen_ir::GenRoot)
//! per exported component. Analysis never fails: constructs that cannot be
//! mapped onto the IR are kept as plain elements or text and reported as
//! [`AnalysisWarning`]s.

pub mod analyzer;
pub mod builder;
pub mod components;
pub mod context;
pub mod diagnostics;

pub use analyzer::{classify_expr, Classified, ExprKind, RESERVED_NAMES};
pub use builder::{build_component, build_file, BuildOutput, ComponentIr};
pub use components::{find_components, ComponentDecl};
pub use context::AnalysisContext;
pub use diagnostics::{AnalysisWarning, WarningCode};

/// Parse and build a source file in one step.
pub fn analyze_source(
    path: &str,
    source: &str,
) -> Result<BuildOutput, tplgen_parser::ParseError> {
    let file = tplgen_parser::parse_component(path, source)?;
    Ok(build_file(&file))
}
