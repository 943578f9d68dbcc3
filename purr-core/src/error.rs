//! Error types for the purr core library.
//!
//! Only operations that genuinely touch the outside world return these.
//! Lookup misses, cooldown rejections and sleep gating are ordinary
//! outcomes, not errors.

use thiserror::Error;

/// Top-level error type for all purr operations.
#[derive(Error, Debug)]
pub enum PurrError {
    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Response table source could not be read as CSV.
    #[error("Response table error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The engine was asked to do something before `init` ran.
    #[error("Engine not initialized: {operation}")]
    NotInitialized {
        /// Which operation was attempted.
        operation: &'static str,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PurrError>;
