//! configure-and-send - fixture for error-reporting client configuration
//!
//! Selects a configuration case, applies it to a notifier client, and sends
//! an error event or starts a session so an external test suite can observe
//! what the client delivered.

pub mod cli;
pub mod commands;
pub mod common;
pub mod notifier;

// Re-export commonly used types for tests
pub use commands::{Case, SendMode};
pub use common::{Error, Result};
