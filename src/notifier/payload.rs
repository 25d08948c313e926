//! JSON payloads accepted by the collection service
//!
//! Event payloads carry one event each; session payloads carry per-minute
//! counts of started sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::config::ActiveConfiguration;
use super::event::{Event, MetaData};
use super::session::Session;

/// Payload version header value for events
pub const EVENT_PAYLOAD_VERSION: &str = "4";

/// Payload version header value for sessions
pub const SESSION_PAYLOAD_VERSION: &str = "1.0";

/// Severity of every event; all events are handled
const HANDLED_SEVERITY: &str = "warning";

/// Identifies this client in every payload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotifierInfo {
    pub name: String,
    pub version: String,
    pub url: String,
}

impl NotifierInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            url: env!("CARGO_PKG_HOMEPAGE").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub app_type: Option<String>,
    pub release_stage: String,
}

impl AppInfo {
    fn from_config(config: &ActiveConfiguration) -> Self {
        Self {
            version: config.app_version.clone(),
            app_type: config.app_type.clone(),
            release_stage: config.release_stage.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl DeviceInfo {
    fn from_config(config: &ActiveConfiguration) -> Self {
        Self {
            hostname: config.hostname.clone(),
        }
    }
}

/// Body posted to the notify endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub api_key: String,
    pub notifier: NotifierInfo,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub payload_version: &'static str,
    pub exceptions: Vec<ExceptionRecord>,
    pub severity: &'static str,
    pub severity_reason: SeverityReason,
    pub unhandled: bool,
    #[serde(rename = "metaData")]
    pub metadata: MetaData,
    pub app: AppInfo,
    pub device: DeviceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityReason {
    #[serde(rename = "type")]
    pub reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRecord {
    pub error_class: String,
    pub message: String,
    pub stacktrace: Vec<FrameRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub method: String,
    pub file: String,
    pub line_number: u32,
    pub in_project: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub events: SessionEventCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEventCounts {
    pub handled: u32,
    pub unhandled: u32,
}

impl EventPayload {
    /// Build the payload for one event
    ///
    /// Metadata is redacted with the configured params filters and frames are
    /// marked against the configured project packages.
    pub fn new(config: &ActiveConfiguration, event: &Event, session: Option<&Session>) -> Self {
        let stacktrace = event
            .stacktrace
            .iter()
            .map(|frame| FrameRecord {
                method: frame.method.clone(),
                file: frame.file.clone(),
                line_number: frame.line,
                in_project: config.is_project_package(&frame.method),
            })
            .collect();

        let record = EventRecord {
            payload_version: EVENT_PAYLOAD_VERSION,
            exceptions: vec![ExceptionRecord {
                error_class: event.error_class.clone(),
                message: event.message.clone(),
                stacktrace,
            }],
            severity: HANDLED_SEVERITY,
            severity_reason: SeverityReason {
                reason: "handledError",
            },
            unhandled: false,
            metadata: event.metadata.sanitized(|key| config.should_redact(key)),
            app: AppInfo::from_config(config),
            device: DeviceInfo::from_config(config),
            session: session.map(|s| SessionRecord {
                id: s.id,
                started_at: s.started_at,
                events: SessionEventCounts {
                    handled: s.handled,
                    unhandled: s.unhandled,
                },
            }),
        };

        Self {
            api_key: config.api_key.clone(),
            notifier: NotifierInfo::current(),
            events: vec![record],
        }
    }
}

/// Body posted to the sessions endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub notifier: NotifierInfo,
    pub app: AppInfo,
    pub device: DeviceInfo,
    pub session_counts: Vec<SessionCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCount {
    pub started_at: String,
    pub sessions_started: u32,
}

impl SessionPayload {
    /// Build the payload for a batch of sessions, counted per started minute
    pub fn new(config: &ActiveConfiguration, sessions: &[Session]) -> Self {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for session in sessions {
            *counts.entry(minute_of(session.started_at)).or_default() += 1;
        }

        Self {
            notifier: NotifierInfo::current(),
            app: AppInfo::from_config(config),
            device: DeviceInfo::from_config(config),
            session_counts: counts
                .into_iter()
                .map(|(started_at, sessions_started)| SessionCount {
                    started_at,
                    sessions_started,
                })
                .collect(),
        }
    }
}

fn minute_of(at: DateTime<Utc>) -> String {
    let truncated = at
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at);
    truncated.to_rfc3339_opts(SecondsFormat::Secs, true)
}
