//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure a command can hit so `main` can
//! propagate with `?` and exit non-zero.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: apothecary_core::config::ConfigError,
    },

    /// Database connection or migration failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: apothecary_db::DbError,
    },

    /// A planning call failed.
    #[error("planning error: {source}")]
    Planning {
        /// The underlying planning error.
        #[from]
        source: apothecary_core::PlanningError,
    },

    /// Recording a delivery or sale failed.
    #[error("mutation error: {source}")]
    Mutation {
        /// The underlying mutation error.
        #[from]
        source: apothecary_core::MutationError,
    },

    /// An input file could not be read.
    #[error("failed to read {path}: {source}")]
    Input {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// JSON input or output failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
