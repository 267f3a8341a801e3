//! Error types for component source parsing.

use source_map::Location;
use std::fmt;

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Malformed component source. Fatal for that file only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Where the error occurred.
    pub location: Location,
    /// The error code.
    pub code: ErrorCode,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, location: Location, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            location,
            code,
        }
    }

    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Self::new(message, location, ErrorCode::SyntaxError)
    }

    /// Create an error for a source the parser only accepted after recovery.
    pub fn recovered(message: impl Into<String>, location: Location) -> Self {
        Self::new(message, location, ErrorCode::RecoveredError)
    }
}

/// Error codes for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The parser gave up.
    SyntaxError,
    /// The parser recovered, but the source is still invalid.
    RecoveredError,
    /// The source is too large to address with 32-bit offsets.
    SourceTooLarge,
}

impl ErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "syntax-error",
            ErrorCode::RecoveredError => "recovered-error",
            ErrorCode::SourceTooLarge => "source-too-large",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
