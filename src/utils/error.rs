use std::time::Duration;

use thiserror::Error;

use crate::core::navigator::PageState;

/// Failures reported by a browser session.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout:?} waiting for {selector}")]
    Timeout { selector: String, timeout: Duration },

    #[error("Element not interactable: {selector}: {message}")]
    NotInteractable { selector: String, message: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Session error: {0}")]
    Session(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Gave up on {target} after {attempts} attempts: {source}")]
    ExhaustedRetries {
        target: String,
        attempts: u32,
        #[source]
        source: DriverError,
    },

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: PageState },

    #[error("Browser error: {0}")]
    Driver(#[from] DriverError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

impl AppError {
    /// Whether the error came out of the navigation phase.
    pub fn is_navigation_failure(&self) -> bool {
        matches!(
            self,
            AppError::ExhaustedRetries { .. } | AppError::InvalidTransition { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
