//! CLI argument definitions
//!
//! Both selectors are closed enums, so an unknown `--case` or `--send` value is
//! rejected by clap before any configuration is built.

use clap::ValueEnum;
use std::fmt;

/// Configuration case to exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Case {
    /// API key and both endpoints from the environment
    Default,
    /// Default plus APP_VERSION
    #[value(alias = "app version")]
    AppVersion,
    /// Default plus APP_TYPE
    #[value(alias = "app type")]
    AppType,
    /// API key and the legacy single endpoint
    #[value(alias = "legacy endpoint")]
    LegacyEndpoint,
    /// Default plus HOSTNAME
    Hostname,
    /// Default plus NOTIFY_RELEASE_STAGES and RELEASE_STAGE
    #[value(alias = "release stage")]
    ReleaseStage,
    /// Default plus an interception callback; sends three events itself
    #[value(alias = "on before notify")]
    OnBeforeNotify,
    /// Default plus PARAMS_FILTERS
    #[value(alias = "params filters")]
    ParamsFilters,
    /// Default plus PROJECT_PACKAGES
    #[value(alias = "project packages")]
    ProjectPackages,
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// What to send once the case has run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SendMode {
    /// Send one error event
    Error,
    /// Start a session and let it publish
    Session,
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Session => write!(f, "session"),
        }
    }
}
