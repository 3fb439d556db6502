// ── Core error types ──
//
// Lookups never fail loudly: a missing collection, field, template or
// interface is an `Option::None`. The variants below are the cases that
// indicate a deployment or configuration mistake and must abort the
// operation that hit them.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("data source {key} does not exist")]
    UnknownDataSource { key: String },

    #[error("the default data source '{key}' cannot be removed")]
    DefaultDataSource { key: String },

    #[error("Invalid collection options: {message}")]
    InvalidOptions { message: String },

    // ── Reload errors ────────────────────────────────────────────────
    #[error("Reload of {scope} failed: {message}")]
    Provider { scope: String, message: String },

    // ── Serialization ────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a provider failure in the given reload scope.
    pub fn provider(scope: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Provider {
            scope: scope.into(),
            message: message.to_string(),
        }
    }

    /// True for errors caused by configuration rather than data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownDataSource { .. } | Self::DefaultDataSource { .. } | Self::InvalidOptions { .. }
        )
    }
}
