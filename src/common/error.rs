//! Error types for the configure-and-send fixture
//!
//! Messages name the offending input so a failing scenario can be traced back
//! to the environment or settings file that caused it.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the fixture and its notifier client
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Both a legacy endpoint and notify/sessions endpoints were configured; use one form"
    )]
    ConflictingEndpoints,

    #[error("Invalid settings file: {0}")]
    SettingsParse(String),

    // === Delivery Errors ===
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery to '{url}' rejected with HTTP {status}")]
    DeliveryRejected { url: String, status: u16 },

    #[error("Session tracker is no longer running")]
    TrackerClosed,

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a delivery rejected error
    pub fn delivery_rejected(url: &str, status: u16) -> Self {
        Self::DeliveryRejected {
            url: url.to_string(),
            status,
        }
    }
}
