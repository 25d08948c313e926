//! Common utilities shared by the fixture and the notifier client

pub mod config;
pub mod env;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
