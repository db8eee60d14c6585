//! Error types for the RustedCode domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all RustedCode operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Context memory errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid tier: {0}")]
    InvalidTier(String),

    #[error("compaction failed: {0}")]
    CompactionFailed(String),

    /// The item was stored; only the overflow-triggered compaction failed.
    #[error("item stored but automatic compaction failed: {0}")]
    AutoCompaction(#[source] Box<ContextError>),

    #[error("context lock poisoned: {0}")]
    LockPoisoned(String),
}

impl ContextError {
    /// Whether callers should treat this as a warning rather than a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, ContextError::AutoCompaction(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_error_displays_correctly() {
        let err = Error::Context(ContextError::InvalidTier("archive".into()));
        assert!(err.to_string().contains("invalid tier"));
        assert!(err.to_string().contains("archive"));
    }

    #[test]
    fn auto_compaction_wraps_source() {
        let inner = ContextError::CompactionFailed("no items to compress".into());
        let err = ContextError::AutoCompaction(Box::new(inner));
        assert!(err.is_warning());
        assert!(err.to_string().contains("no items to compress"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn lock_poisoned_is_not_a_warning() {
        assert!(!ContextError::LockPoisoned("query".into()).is_warning());
    }
}
