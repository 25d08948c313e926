//! Payload delivery
//!
//! Every payload is posted once. Failures are reported to the caller and never
//! retried here.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info_span, Instrument};

use crate::common::{Error, Result};

use super::config::ActiveConfiguration;
use super::payload::{EventPayload, SessionPayload, EVENT_PAYLOAD_VERSION, SESSION_PAYLOAD_VERSION};

pub const API_KEY_HEADER: &str = "Bugsnag-Api-Key";
pub const PAYLOAD_VERSION_HEADER: &str = "Bugsnag-Payload-Version";
pub const SENT_AT_HEADER: &str = "Bugsnag-Sent-At";

/// What a delivery request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Event,
    Session,
}

/// A single payload ready to post
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub kind: PayloadKind,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl DeliveryRequest {
    /// Request for an event payload, addressed to the notify endpoint
    pub fn event(config: &ActiveConfiguration, payload: &EventPayload) -> Result<Self> {
        Self::build(
            PayloadKind::Event,
            config.notify_endpoint.clone(),
            &config.api_key,
            EVENT_PAYLOAD_VERSION,
            payload,
        )
    }

    /// Request for a session payload
    ///
    /// Returns a configuration error when session delivery is disabled.
    pub fn session(config: &ActiveConfiguration, payload: &SessionPayload) -> Result<Self> {
        let url = config
            .sessions_endpoint
            .clone()
            .ok_or_else(|| Error::Config("no sessions endpoint configured".to_string()))?;
        Self::build(
            PayloadKind::Session,
            url,
            &config.api_key,
            SESSION_PAYLOAD_VERSION,
            payload,
        )
    }

    fn build<T: Serialize>(
        kind: PayloadKind,
        url: String,
        api_key: &str,
        version: &str,
        payload: &T,
    ) -> Result<Self> {
        let mut headers = BTreeMap::new();
        headers.insert(API_KEY_HEADER.to_string(), api_key.to_string());
        headers.insert(PAYLOAD_VERSION_HEADER.to_string(), version.to_string());
        headers.insert(
            SENT_AT_HEADER.to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        Ok(Self {
            kind,
            url,
            headers,
            body: serde_json::to_value(payload)?,
        })
    }
}

/// Sends delivery requests to the collection service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one request, returning once the attempt has completed
    async fn deliver(&self, request: DeliveryRequest) -> Result<()>;
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, request: DeliveryRequest) -> Result<()> {
        let span = info_span!("deliver", kind = ?request.kind, url = %request.url);

        async {
            let mut builder = self.client.post(&request.url).json(&request.body);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder.send().await?;
            let status = response.status();
            debug!(status = status.as_u16(), "Delivery attempt completed");

            if status.is_success() {
                Ok(())
            } else {
                Err(Error::delivery_rejected(&request.url, status.as_u16()))
            }
        }
        .instrument(span)
        .await
    }
}

/// Transport that records requests in memory instead of sending them
///
/// Cloning shares the recorded requests, so a test can keep one clone and hand
/// another to the client.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    requests: Arc<Mutex<Vec<DeliveryRequest>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests delivered so far
    pub async fn requests(&self) -> Vec<DeliveryRequest> {
        self.requests.lock().await.clone()
    }

    /// Requests of one kind delivered so far
    pub async fn requests_of(&self, kind: PayloadKind) -> Vec<DeliveryRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn deliver(&self, request: DeliveryRequest) -> Result<()> {
        self.requests.lock().await.push(request);
        Ok(())
    }
}
