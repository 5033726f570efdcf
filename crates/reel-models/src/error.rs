//! Parse errors for model values read from configuration or requests.

use thiserror::Error;

/// Result type for model parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced when parsing textual model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid darkness policy: {0}")]
    InvalidDarknessPolicy(String),

    #[error("invalid music volume: {0}")]
    InvalidVolume(String),
}
