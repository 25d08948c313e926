//! Client context
//!
//! A [`Client`] owns everything that would otherwise be process-wide state:
//! the active configuration, the single interception-callback slot, the
//! transport and the session tracker. It can only be built from a
//! configuration, so nothing can be sent before configuring.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::common::Result;

use super::config::{ActiveConfiguration, Configuration};
use super::delivery::{DeliveryRequest, HttpTransport, Transport};
use super::event::{Event, Veto};
use super::payload::EventPayload;
use super::session::{self, Session, TrackerHandle, DEFAULT_PUBLISH_INTERVAL};

/// Interception callback run before each event is sent
///
/// Returning `Err(Veto)` suppresses the event. The callback may rewrite the
/// event in place.
pub type OnBeforeNotify =
    Box<dyn Fn(&mut Event, &ActiveConfiguration) -> std::result::Result<(), Veto> + Send + Sync>;

/// What happened to an event passed to [`Client::notify_sync`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Handed to the transport and accepted
    Delivered,
    /// Vetoed by the interception callback
    Suppressed(Veto),
    /// Release stage is not in the notify release stages
    Skipped,
}

/// Construction options for [`Client`]
#[derive(Clone)]
pub struct ClientOptions {
    /// Transport to deliver with; an HTTP transport is built when unset
    pub transport: Option<Arc<dyn Transport>>,
    pub session_publish_interval: Duration,
    /// Timeout for the HTTP transport built when `transport` is unset
    pub delivery_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            transport: None,
            session_publish_interval: DEFAULT_PUBLISH_INTERVAL,
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("session_publish_interval", &self.session_publish_interval)
            .field("delivery_timeout", &self.delivery_timeout)
            .finish()
    }
}

/// Error-reporting client context
pub struct Client {
    config: Arc<ActiveConfiguration>,
    transport: Arc<dyn Transport>,
    on_before_notify: Option<OnBeforeNotify>,
    current_session: Mutex<Option<Session>>,
    sessions: TrackerHandle,
}

impl Client {
    /// Resolve `config` and start the client
    ///
    /// Spawns the session tracker, so this must be called from within a tokio
    /// runtime.
    pub fn configure(config: Configuration, options: ClientOptions) -> Result<Self> {
        let config = Arc::new(config.resolve()?);

        let transport = match options.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(options.delivery_timeout)?),
        };

        let sessions = session::spawn(
            config.clone(),
            transport.clone(),
            options.session_publish_interval,
        );

        info!(
            notify = %config.notify_endpoint,
            sessions = ?config.sessions_endpoint,
            release_stage = %config.release_stage,
            "Client configured"
        );

        Ok(Self {
            config,
            transport,
            on_before_notify: None,
            current_session: Mutex::new(None),
            sessions,
        })
    }

    /// Register the interception callback, replacing any earlier one
    pub fn on_before_notify<F>(&mut self, callback: F)
    where
        F: Fn(&mut Event, &ActiveConfiguration) -> std::result::Result<(), Veto>
            + Send
            + Sync
            + 'static,
    {
        if self.on_before_notify.is_some() {
            debug!("Replacing existing interception callback");
        }
        self.on_before_notify = Some(Box::new(callback));
    }

    /// Send an event and wait for the delivery attempt to finish
    ///
    /// The interception callback runs first, then release-stage gating. A veto
    /// or a filtered release stage is not an error; a failed delivery is.
    pub async fn notify_sync(&self, mut event: Event) -> Result<NotifyOutcome> {
        if let Some(callback) = &self.on_before_notify {
            if let Err(veto) = callback(&mut event, &self.config) {
                debug!(message = %event.message, reason = %veto, "Event suppressed by callback");
                return Ok(NotifyOutcome::Suppressed(veto));
            }
        }

        if !self.config.notify_in_release_stage() {
            debug!(
                message = %event.message,
                release_stage = %self.config.release_stage,
                "Release stage not notified, skipping event"
            );
            return Ok(NotifyOutcome::Skipped);
        }

        let session = {
            let mut current = self.current_session.lock().await;
            if let Some(session) = current.as_mut() {
                session.handled += 1;
            }
            current.clone()
        };

        let payload = EventPayload::new(&self.config, &event, session.as_ref());
        let request = DeliveryRequest::event(&self.config, &payload)?;

        info!(message = %event.message, url = %request.url, "Notifying");
        self.transport.deliver(request).await?;

        Ok(NotifyOutcome::Delivered)
    }

    /// Start a new session and queue it for publishing
    pub async fn start_session(&self) -> Result<Session> {
        let session = Session::start();
        *self.current_session.lock().await = Some(session.clone());
        self.sessions.start(session.clone()).await?;
        info!(id = %session.id, "Session started");
        Ok(session)
    }

    /// Publish pending sessions now and wait for the attempt to finish
    pub async fn flush(&self) -> Result<()> {
        self.sessions.flush().await
    }

    /// Flush pending sessions and stop the session tracker
    pub async fn shutdown(self) -> Result<()> {
        self.sessions.shutdown().await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("on_before_notify", &self.on_before_notify.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::config::Endpoints;
    use crate::notifier::delivery::{MemoryTransport, PayloadKind};

    fn client(config: Configuration) -> (Client, MemoryTransport) {
        let transport = MemoryTransport::new();
        let client = Client::configure(
            config,
            ClientOptions {
                transport: Some(Arc::new(transport.clone())),
                ..Default::default()
            },
        )
        .unwrap();
        (client, transport)
    }

    fn base() -> Configuration {
        Configuration {
            api_key: "key".to_string(),
            endpoints: Some(Endpoints {
                notify: "http://localhost/notify".to_string(),
                sessions: "http://localhost/sessions".to_string(),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_notify_delivers() {
        let (client, transport) = client(base());

        let outcome = client.notify_sync(Event::new("oops")).await.unwrap();
        assert_eq!(outcome, NotifyOutcome::Delivered);

        let requests = transport.requests_of(PayloadKind::Event).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://localhost/notify");
    }

    #[tokio::test]
    async fn test_callback_veto_and_rewrite() {
        let (mut client, transport) = client(base());
        client.on_before_notify(|event, _| {
            if event.message == "drop" {
                return Err(Veto::new("dropped"));
            }
            event.message.push_str(" (seen)");
            Ok(())
        });

        let vetoed = client.notify_sync(Event::new("drop")).await.unwrap();
        assert_eq!(vetoed, NotifyOutcome::Suppressed(Veto::new("dropped")));
        client.notify_sync(Event::new("keep")).await.unwrap();

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body["events"][0]["exceptions"][0]["message"], "keep (seen)");
    }

    #[tokio::test]
    async fn test_last_callback_wins() {
        let (mut client, transport) = client(base());
        client.on_before_notify(|_, _| Err(Veto::new("first")));
        client.on_before_notify(|_, _| Ok(()));

        let outcome = client.notify_sync(Event::new("oops")).await.unwrap();
        assert_eq!(outcome, NotifyOutcome::Delivered);
        assert_eq!(transport.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_release_stage_skips() {
        let mut config = base();
        config.notify_release_stages = Some(vec!["production".to_string()]);
        config.release_stage = Some("staging".to_string());
        let (client, transport) = client(config);

        let outcome = client.notify_sync(Event::new("oops")).await.unwrap();
        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_event_carries_session() {
        let (client, transport) = client(base());
        let session = client.start_session().await.unwrap();
        client.notify_sync(Event::new("oops")).await.unwrap();
        client.shutdown().await.unwrap();

        let events = transport.requests_of(PayloadKind::Event).await;
        let record = &events[0].body["events"][0]["session"];
        assert_eq!(record["id"], session.id.to_string());
        assert_eq!(record["events"]["handled"], 1);

        assert_eq!(transport.requests_of(PayloadKind::Session).await.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_delivers_session_before_shutdown() {
        let transport = MemoryTransport::new();
        let client = Client::configure(
            base(),
            ClientOptions {
                transport: Some(Arc::new(transport.clone())),
                session_publish_interval: Duration::from_secs(3600),
                ..Default::default()
            },
        )
        .unwrap();

        client.start_session().await.unwrap();
        client.flush().await.unwrap();

        let sessions = transport.requests_of(PayloadKind::Session).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].url, "http://localhost/sessions");

        client.shutdown().await.unwrap();
        assert_eq!(transport.requests_of(PayloadKind::Session).await.len(), 1);
    }

    #[tokio::test]
    async fn test_notify_only_endpoint_sends_no_sessions() {
        let mut config = base();
        config.endpoints = Some(Endpoints {
            notify: "http://localhost/notify".to_string(),
            sessions: String::new(),
        });
        let (client, transport) = client(config);

        client.start_session().await.unwrap();
        client.notify_sync(Event::new("oops")).await.unwrap();
        client.shutdown().await.unwrap();

        assert_eq!(transport.requests_of(PayloadKind::Event).await.len(), 1);
        assert!(transport.requests_of(PayloadKind::Session).await.is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_configuration_rejected() {
        let mut config = base();
        config.endpoint = Some("http://localhost/legacy".to_string());
        let result = Client::configure(config, ClientOptions::default());
        assert!(matches!(result, Err(crate::Error::ConflictingEndpoints)));
    }
}
