//! Error types for the onboarding engine.

use crate::onboarding::page::PageType;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Settings store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Refused tutorial transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TutorialError {
    #[error("No tutorial script registered for page type {page_type}")]
    NoScript { page_type: PageType },

    #[error("A tutorial is already active ({page_type})")]
    AlreadyActive { page_type: PageType },

    #[error("No tutorial is active")]
    NotActive,
}
