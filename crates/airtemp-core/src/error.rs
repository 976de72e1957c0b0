//! Host-level error types.
//!
//! Accessory crates keep their own typed errors; the host folds them into
//! [`AppError`] when reporting a failed read or a lifecycle problem.

use thiserror::Error;

/// Top-level host error type.
///
/// Use `user_message()` for a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A read from an accessory failed; carries the accessory's own message.
    #[error("{accessory}: {message}")]
    Accessory { accessory: String, message: String },
}

impl AppError {
    pub fn accessory(accessory: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Accessory {
            accessory: accessory.into(),
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Accessory { .. } => "The sensor could not be read. It will be retried.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
