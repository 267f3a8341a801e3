//! Analysis warnings.

use source_map::Location;
use std::fmt;

/// An ambiguous or unsupported construct that was folded to a best-effort
/// passthrough. Never blocks emission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {message} [{code}]")]
pub struct AnalysisWarning {
    /// The warning message.
    pub message: String,
    /// Where the construct is.
    pub location: Location,
    /// The warning code.
    pub code: WarningCode,
}

impl AnalysisWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, location: Location, code: WarningCode) -> Self {
        Self {
            message: message.into(),
            location,
            code,
        }
    }
}

/// Warning codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// An expression no detector matched.
    UnrecognizedExpression,
    /// A conditional whose predicate may have side effects.
    SideEffectPredicate,
    /// A conditional whose predicate uses unsupported syntax.
    UnsupportedPredicate,
    /// A `.map` call whose callback shape is not supported.
    UnsupportedLoop,
    /// A statement in a component body other than an early `return`.
    UnsupportedStatement,
    /// A reserved marker missing a required attribute.
    MalformedMarker,
    /// A `{...spread}` attribute.
    SpreadAttribute,
    /// An attribute value that is not a literal or a path.
    UnsupportedAttribute,
    /// Content that has no place in the IR, such as non-block children of `<Extends>`.
    DroppedContent,
    /// A component named like a reserved marker.
    ReservedName,
    /// A file that exports no components.
    NoComponents,
}

impl WarningCode {
    /// Get the code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnrecognizedExpression => "unrecognized-expression",
            Self::SideEffectPredicate => "side-effect-predicate",
            Self::UnsupportedPredicate => "unsupported-predicate",
            Self::UnsupportedLoop => "unsupported-loop",
            Self::UnsupportedStatement => "unsupported-statement",
            Self::MalformedMarker => "malformed-marker",
            Self::SpreadAttribute => "spread-attribute",
            Self::UnsupportedAttribute => "unsupported-attribute",
            Self::DroppedContent => "dropped-content",
            Self::ReservedName => "reserved-name",
            Self::NoComponents => "no-components",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
