//! Emission errors.

use smol_str::SmolStr;
use source_map::Location;
use thiserror::Error;
use tplgen_ir::NodeKind;

/// A backend cannot express an IR node. Fatal for one (file, backend) pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: backend `{backend}` cannot express {node_kind}: {reason}")]
pub struct UnsupportedFeatureError {
    pub node_kind: NodeKind,
    pub backend: SmolStr,
    pub location: Location,
    pub reason: String,
}

impl UnsupportedFeatureError {
    /// Get the diagnostic code.
    pub fn code(&self) -> &'static str {
        "unsupported-feature"
    }
}

/// Errors from the backend registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown backend `{id}` (available: {})", .known.join(", "))]
    UnknownBackend { id: String, known: Vec<String> },
}

/// Result of rendering into an [`EmitContext`](crate::EmitContext).
pub type EmitResult<T = ()> = Result<T, UnsupportedFeatureError>;
