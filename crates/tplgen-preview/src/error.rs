//! Preview errors.

use smol_str::SmolStr;
use source_map::Location;
use thiserror::Error;

/// A component cannot be rendered against the given data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("{location}: template `{name}` is not in the template set")]
    UnknownTemplate { name: SmolStr, location: Location },

    #[error("{location}: unknown filter `{name}`")]
    UnknownFilter { name: SmolStr, location: Location },

    #[error("{location}: `{path}` is not an array")]
    NotIterable { path: String, location: Location },

    #[error("{location}: `{path}` is an object and cannot be rendered as text")]
    ObjectChild { path: String, location: Location },

    #[error("{location}: templates nest more than {limit} levels deep")]
    RecursionLimit { limit: usize, location: Location },
}

impl PreviewError {
    /// Get the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTemplate { .. } => "unknown-template",
            Self::UnknownFilter { .. } => "unknown-filter",
            Self::NotIterable { .. } => "not-iterable",
            Self::ObjectChild { .. } => "object-child",
            Self::RecursionLimit { .. } => "recursion-limit",
        }
    }

    /// Get the location of the node that failed.
    pub fn location(&self) -> &Location {
        match self {
            Self::UnknownTemplate { location, .. }
            | Self::UnknownFilter { location, .. }
            | Self::NotIterable { location, .. }
            | Self::ObjectChild { location, .. }
            | Self::RecursionLimit { location, .. } => location,
        }
    }
}

/// Result of a preview render.
pub type PreviewResult<T> = Result<T, PreviewError>;
