//! Environment variable snapshot
//!
//! Cases read their inputs through an [`Environment`] rather than
//! `std::env` directly, so tests can supply values without touching the
//! process environment.

use std::collections::HashMap;

pub const API_KEY: &str = "API_KEY";
pub const NOTIFY_ENDPOINT: &str = "NOTIFY_ENDPOINT";
pub const SESSIONS_ENDPOINT: &str = "SESSIONS_ENDPOINT";
pub const APP_VERSION: &str = "APP_VERSION";
pub const APP_TYPE: &str = "APP_TYPE";
pub const HOSTNAME: &str = "HOSTNAME";
pub const NOTIFY_RELEASE_STAGES: &str = "NOTIFY_RELEASE_STAGES";
pub const RELEASE_STAGE: &str = "RELEASE_STAGE";
pub const PARAMS_FILTERS: &str = "PARAMS_FILTERS";
pub const PROJECT_PACKAGES: &str = "PROJECT_PACKAGES";

/// Every variable the fixture reads
pub const ALL: &[&str] = &[
    API_KEY,
    NOTIFY_ENDPOINT,
    SESSIONS_ENDPOINT,
    APP_VERSION,
    APP_TYPE,
    HOSTNAME,
    NOTIFY_RELEASE_STAGES,
    RELEASE_STAGE,
    PARAMS_FILTERS,
    PROJECT_PACKAGES,
];

/// Immutable view of the variables a case may read
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the fixture's variables from the process environment
    ///
    /// Variables that are unset or not valid unicode read as empty.
    pub fn from_process() -> Self {
        let vars = ALL
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        Self { vars }
    }

    /// Build an environment from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of a variable, empty when unset
    pub fn get(&self, name: &str) -> String {
        self.vars.get(name).cloned().unwrap_or_default()
    }

    /// Value of a variable, `None` when unset or empty
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }

    /// Comma-separated list, `None` when unset or empty
    ///
    /// Segments are kept verbatim: no trimming and no dropping of empty
    /// segments, so `"a,,b"` yields three entries.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.non_empty(name)
            .map(|v| v.split(',').map(String::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_reads_empty() {
        let env = Environment::default();
        assert_eq!(env.get(API_KEY), "");
        assert_eq!(env.non_empty(API_KEY), None);
        assert_eq!(env.list(PARAMS_FILTERS), None);
    }

    #[test]
    fn test_empty_list_is_no_override() {
        let env = Environment::from_pairs([(PARAMS_FILTERS, "")]);
        assert_eq!(env.list(PARAMS_FILTERS), None);
    }

    #[test]
    fn test_list_is_not_trimmed() {
        let env = Environment::from_pairs([(NOTIFY_RELEASE_STAGES, "production, staging,,dev")]);
        assert_eq!(
            env.list(NOTIFY_RELEASE_STAGES).unwrap(),
            vec!["production", " staging", "", "dev"]
        );
    }

    #[test]
    fn test_single_item_list() {
        let env = Environment::from_pairs([(PROJECT_PACKAGES, "main")]);
        assert_eq!(env.list(PROJECT_PACKAGES).unwrap(), vec!["main"]);
    }
}
