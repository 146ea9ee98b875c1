//! Shared primitives for all Rust crates in Audex.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Audex crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Pagination cursor could not be decoded or resolved.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// A query could not be given a deterministic total order.
    #[error("order construction error: {0}")]
    OrderConstruction(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for errors callers should surface as client input failures.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidCursor(_) | Self::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn cursor_and_validation_errors_are_client_errors() {
        assert!(AppError::InvalidCursor("bad".to_owned()).is_client_error());
        assert!(AppError::Validation("bad".to_owned()).is_client_error());
        assert!(!AppError::OrderConstruction("bad".to_owned()).is_client_error());
        assert!(!AppError::Internal("bad".to_owned()).is_client_error());
    }
}
