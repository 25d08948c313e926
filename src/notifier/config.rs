//! Client configuration
//!
//! [`Configuration`] is what callers fill in; every optional field stays
//! `None` until explicitly set, so "not configured" never collapses into
//! "configured as empty". [`Configuration::resolve`] merges it onto the
//! client defaults and yields the [`ActiveConfiguration`] the client runs with.

use crate::common::{Error, Result};

/// Default endpoint for error events
pub const DEFAULT_NOTIFY_ENDPOINT: &str = "https://notify.bugsnag.com";

/// Default endpoint for session counts
pub const DEFAULT_SESSIONS_ENDPOINT: &str = "https://sessions.bugsnag.com";

/// Release stage used when none is configured
pub const DEFAULT_RELEASE_STAGE: &str = "production";

/// Metadata keys redacted when no filters are configured
pub const DEFAULT_PARAMS_FILTERS: &[&str] = &["password", "secret"];

/// Project packages used when none are configured
pub const DEFAULT_PROJECT_PACKAGES: &[&str] = &["main*"];

/// Notify and sessions endpoints, configured together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub notify: String,
    pub sessions: String,
}

/// Caller-supplied configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub api_key: String,
    /// Two-endpoint form
    pub endpoints: Option<Endpoints>,
    /// Legacy single notify endpoint; excludes `endpoints`
    pub endpoint: Option<String>,
    pub app_version: Option<String>,
    pub app_type: Option<String>,
    pub hostname: Option<String>,
    pub release_stage: Option<String>,
    pub notify_release_stages: Option<Vec<String>>,
    pub params_filters: Option<Vec<String>>,
    pub project_packages: Option<Vec<String>>,
}

/// Resolved configuration the client operates with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfiguration {
    pub api_key: String,
    pub notify_endpoint: String,
    /// `None` disables session delivery
    pub sessions_endpoint: Option<String>,
    pub app_version: Option<String>,
    pub app_type: Option<String>,
    pub hostname: Option<String>,
    pub release_stage: String,
    pub notify_release_stages: Option<Vec<String>>,
    pub params_filters: Vec<String>,
    pub project_packages: Vec<String>,
}

impl Configuration {
    /// Merge onto the client defaults
    ///
    /// Fails if both endpoint forms are set. Empty strings count as unset. An
    /// empty notify endpoint falls back to the default; session delivery needs
    /// an explicit sessions endpoint whenever a notify endpoint is given, so a
    /// custom notify endpoint never pairs with the default sessions endpoint.
    pub fn resolve(self) -> Result<ActiveConfiguration> {
        let (notify_endpoint, sessions_endpoint) = match (self.endpoints, self.endpoint) {
            (Some(_), Some(_)) => return Err(Error::ConflictingEndpoints),
            (Some(endpoints), None) => resolve_endpoints(
                non_empty(Some(endpoints.notify)),
                non_empty(Some(endpoints.sessions)),
            ),
            (None, Some(endpoint)) => {
                let notify = non_empty(Some(endpoint))
                    .unwrap_or_else(|| DEFAULT_NOTIFY_ENDPOINT.to_string());
                tracing::warn!(
                    endpoint = %notify,
                    "Legacy endpoint configured; sessions will not be delivered"
                );
                (notify, None)
            }
            (None, None) => resolve_endpoints(None, None),
        };

        if !is_valid_api_key(&self.api_key) {
            tracing::warn!("API key should be 32 hexadecimal characters");
        }

        let hostname = non_empty(self.hostname).or_else(|| {
            hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned())
        });

        Ok(ActiveConfiguration {
            api_key: self.api_key,
            notify_endpoint,
            sessions_endpoint,
            app_version: non_empty(self.app_version),
            app_type: non_empty(self.app_type),
            hostname,
            release_stage: non_empty(self.release_stage)
                .unwrap_or_else(|| DEFAULT_RELEASE_STAGE.to_string()),
            notify_release_stages: self.notify_release_stages,
            params_filters: self
                .params_filters
                .unwrap_or_else(|| to_owned(DEFAULT_PARAMS_FILTERS)),
            project_packages: self
                .project_packages
                .unwrap_or_else(|| to_owned(DEFAULT_PROJECT_PACKAGES)),
        })
    }
}

fn resolve_endpoints(
    notify: Option<String>,
    sessions: Option<String>,
) -> (String, Option<String>) {
    match (notify, sessions) {
        (Some(notify), None) => {
            tracing::warn!(
                endpoint = %notify,
                "No sessions endpoint configured; sessions will not be delivered"
            );
            (notify, None)
        }
        (notify, sessions) => (
            notify.unwrap_or_else(|| DEFAULT_NOTIFY_ENDPOINT.to_string()),
            Some(sessions.unwrap_or_else(|| DEFAULT_SESSIONS_ENDPOINT.to_string())),
        ),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ActiveConfiguration {
    /// Whether events and sessions are reported in the current release stage
    pub fn notify_in_release_stage(&self) -> bool {
        match &self.notify_release_stages {
            None => true,
            Some(_) if self.release_stage.is_empty() => true,
            Some(stages) => stages.iter().any(|s| *s == self.release_stage),
        }
    }

    /// Whether a metadata key should be redacted
    pub fn should_redact(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.params_filters
            .iter()
            .any(|filter| key.contains(&filter.to_lowercase()))
    }

    /// Whether a method path belongs to the project
    ///
    /// A pattern ending in `*` matches by prefix. Any other pattern matches the
    /// exact path or a path nested under it.
    pub fn is_project_package(&self, path: &str) -> bool {
        self.project_packages.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                path.starts_with(prefix)
            } else {
                path == pattern
                    || path
                        .strip_prefix(pattern.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            }
        })
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn is_valid_api_key(key: &str) -> bool {
    key.len() == 32 && key.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_endpoints(notify: &str, sessions: &str) -> Configuration {
        Configuration {
            api_key: "a35a2a72bd230ac0aa0f52715bbdc6aa".to_string(),
            endpoints: Some(Endpoints {
                notify: notify.to_string(),
                sessions: sessions.to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let active = with_endpoints("http://localhost/notify", "http://localhost/sessions")
            .resolve()
            .unwrap();
        assert_eq!(active.notify_endpoint, "http://localhost/notify");
        assert_eq!(active.sessions_endpoint.as_deref(), Some("http://localhost/sessions"));
        assert_eq!(active.release_stage, "production");
        assert_eq!(active.params_filters, vec!["password", "secret"]);
        assert_eq!(active.project_packages, vec!["main*"]);
        assert_eq!(active.notify_release_stages, None);
    }

    #[test]
    fn test_empty_endpoints_fall_back() {
        let active = with_endpoints("", "").resolve().unwrap();
        assert_eq!(active.notify_endpoint, DEFAULT_NOTIFY_ENDPOINT);
        assert_eq!(active.sessions_endpoint.as_deref(), Some(DEFAULT_SESSIONS_ENDPOINT));
    }

    #[test]
    fn test_legacy_endpoint_disables_sessions() {
        let active = Configuration {
            endpoint: Some("http://localhost/legacy".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(active.notify_endpoint, "http://localhost/legacy");
        assert_eq!(active.sessions_endpoint, None);
    }

    #[test]
    fn test_empty_legacy_endpoint_falls_back() {
        let active = Configuration {
            endpoint: Some(String::new()),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(active.notify_endpoint, DEFAULT_NOTIFY_ENDPOINT);
        assert_eq!(active.sessions_endpoint, None);
    }

    #[test]
    fn test_notify_without_sessions_disables_sessions() {
        let active = with_endpoints("http://localhost/notify", "").resolve().unwrap();
        assert_eq!(active.notify_endpoint, "http://localhost/notify");
        assert_eq!(active.sessions_endpoint, None);
    }

    #[test]
    fn test_sessions_without_notify() {
        let active = with_endpoints("", "http://localhost/sessions").resolve().unwrap();
        assert_eq!(active.notify_endpoint, DEFAULT_NOTIFY_ENDPOINT);
        assert_eq!(active.sessions_endpoint.as_deref(), Some("http://localhost/sessions"));
    }

    #[test]
    fn test_empty_strings_keep_defaults() {
        let mut config = with_endpoints("", "");
        config.app_version = Some(String::new());
        config.app_type = Some(String::new());
        config.hostname = Some(String::new());
        config.release_stage = Some(String::new());

        let active = config.resolve().unwrap();
        assert_eq!(active.app_version, None);
        assert_eq!(active.app_type, None);
        assert_eq!(active.release_stage, DEFAULT_RELEASE_STAGE);
        assert_ne!(active.hostname.as_deref(), Some(""));
    }

    #[test]
    fn test_conflicting_endpoints() {
        let mut config = with_endpoints("http://a", "http://b");
        config.endpoint = Some("http://c".to_string());
        assert!(matches!(config.resolve(), Err(Error::ConflictingEndpoints)));
    }

    #[test]
    fn test_explicit_hostname_kept() {
        let mut config = with_endpoints("", "");
        config.hostname = Some("server-1".to_string());
        assert_eq!(config.resolve().unwrap().hostname.as_deref(), Some("server-1"));
    }

    #[test]
    fn test_notify_in_release_stage() {
        let mut active = with_endpoints("", "").resolve().unwrap();
        assert!(active.notify_in_release_stage());

        active.notify_release_stages = Some(vec!["staging".to_string()]);
        assert!(!active.notify_in_release_stage());

        active.release_stage = "staging".to_string();
        assert!(active.notify_in_release_stage());

        active.release_stage = String::new();
        assert!(active.notify_in_release_stage());
    }

    #[test]
    fn test_should_redact_case_insensitive() {
        let active = with_endpoints("", "").resolve().unwrap();
        assert!(active.should_redact("Password"));
        assert!(active.should_redact("client_secret"));
        assert!(!active.should_redact("Name"));
    }

    #[test]
    fn test_project_package_patterns() {
        let mut active = with_endpoints("", "").resolve().unwrap();
        active.project_packages = vec!["fixture".to_string(), "configure_and_send*".to_string()];

        assert!(active.is_project_package("fixture"));
        assert!(active.is_project_package("fixture::cli::send"));
        assert!(!active.is_project_package("fixtures::other"));
        assert!(active.is_project_package("configure_and_send::main"));
        assert!(!active.is_project_package("tokio::runtime"));
    }

    #[test]
    fn test_api_key_validation() {
        assert!(is_valid_api_key("a35a2a72bd230ac0aa0f52715bbdc6aa"));
        assert!(!is_valid_api_key("not-a-key"));
        assert!(!is_valid_api_key(""));
    }
}
