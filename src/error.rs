//! Error types for gait-rag.
//!
//! Uses `thiserror` for the typed errors each component returns. The binary
//! and the REPL use `anyhow` on top of these for plumbing, and decide per
//! error kind whether to degrade, reject, or fall back.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the entity and definition stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },
}

/// Rejected input for a new entity. The store is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("{0} already exists in the database")]
    DuplicateName(String),

    #[error("invalid type '{0}': expected human or animal")]
    InvalidKind(String),

    #[error("invalid heel strike '{0}': expected low, medium, high, or none")]
    InvalidHeelStrike(String),

    #[error("invalid {field} '{value}': expected a positive number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("input ended before the entity was complete")]
    Incomplete,
}

/// Failures of the completion capability.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("completion provider is disabled: {0}")]
    Disabled(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Format(String),
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found: set {0} in the environment or a .env file")]
    MissingApiKey(String),
}
