//! Session tracking
//!
//! Started sessions are queued to a background task that publishes them as
//! per-minute counts on a fixed interval. The task never blocks callers
//! beyond the channel send; `flush` and `shutdown` wait for an
//! acknowledgement so exit can be ordered after delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::common::{Error, Result};

use super::config::ActiveConfiguration;
use super::delivery::{DeliveryRequest, Transport};
use super::payload::SessionPayload;

/// Publish interval used outside the harness
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(60);

const CHANNEL_BUFFER: usize = 64;

/// An application run interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub handled: u32,
    pub unhandled: u32,
}

impl Session {
    /// A new session starting now
    pub fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            handled: 0,
            unhandled: 0,
        }
    }
}

/// Commands sent to the tracker task
enum TrackerCommand {
    Start(Session),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle for feeding the tracker task
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerCommand>,
}

impl TrackerHandle {
    /// Queue a started session for the next publish
    pub async fn start(&self, session: Session) -> Result<()> {
        self.tx
            .send(TrackerCommand::Start(session))
            .await
            .map_err(|_| Error::TrackerClosed)
    }

    /// Publish pending sessions now and wait until the attempt completes
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(TrackerCommand::Flush(ack))
            .await
            .map_err(|_| Error::TrackerClosed)?;
        done.await.map_err(|_| Error::TrackerClosed)
    }

    /// Publish pending sessions and stop the task
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(TrackerCommand::Shutdown(ack))
            .await
            .map_err(|_| Error::TrackerClosed)?;
        done.await.map_err(|_| Error::TrackerClosed)
    }
}

/// Background publisher for started sessions
pub struct SessionTracker {
    config: Arc<ActiveConfiguration>,
    transport: Arc<dyn Transport>,
    interval: Duration,
    rx: mpsc::Receiver<TrackerCommand>,
    pending: Vec<Session>,
}

impl SessionTracker {
    /// Create a tracker and its handle
    ///
    /// The tracker must be spawned as a task using `run()`.
    pub fn new(
        config: Arc<ActiveConfiguration>,
        transport: Arc<dyn Transport>,
        interval: Duration,
    ) -> (Self, TrackerHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);

        let tracker = Self {
            config,
            transport,
            // tokio intervals cannot have a zero period
            interval: interval.max(Duration::from_millis(1)),
            rx,
            pending: Vec::new(),
        };

        (tracker, TrackerHandle { tx })
    }

    /// Run the publish loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        debug!(
            interval_ms = self.interval.as_millis() as u64,
            endpoint = ?self.config.sessions_endpoint,
            "Session tracker started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.publish().await;
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(TrackerCommand::Start(session)) => {
                            trace!(id = %session.id, "Session queued");
                            self.pending.push(session);
                        }
                        Some(TrackerCommand::Flush(ack)) => {
                            self.publish().await;
                            let _ = ack.send(());
                        }
                        Some(TrackerCommand::Shutdown(ack)) => {
                            debug!("Session tracker shutting down");
                            self.publish().await;
                            let _ = ack.send(());
                            break;
                        }
                        None => {
                            self.publish().await;
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Publish and clear pending sessions
    ///
    /// Sessions are dropped when delivery is disabled or fails; there is no
    /// retry.
    async fn publish(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let sessions = std::mem::take(&mut self.pending);

        if !self.config.notify_in_release_stage() {
            debug!(
                release_stage = %self.config.release_stage,
                count = sessions.len(),
                "Release stage not notified, dropping sessions"
            );
            return;
        }

        let payload = SessionPayload::new(&self.config, &sessions);
        let request = match DeliveryRequest::session(&self.config, &payload) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, count = sessions.len(), "Sessions not delivered");
                return;
            }
        };

        match self.transport.deliver(request).await {
            Ok(()) => debug!(count = sessions.len(), "Sessions published"),
            Err(e) => warn!(error = %e, count = sessions.len(), "Failed to publish sessions"),
        }
    }
}

/// Spawn the tracker as a background task
pub fn spawn(
    config: Arc<ActiveConfiguration>,
    transport: Arc<dyn Transport>,
    interval: Duration,
) -> TrackerHandle {
    let (tracker, handle) = SessionTracker::new(config, transport, interval);
    tokio::spawn(tracker.run());
    handle
}
