//! Fixture control flow
//!
//! Runs the selected case, then the selected send action, then shuts the
//! client down so pending sessions are flushed before the process exits.

pub mod cases;
pub mod send;

use std::sync::Arc;

use crate::commands::{Case, SendMode};
use crate::common::config::HarnessSettings;
use crate::common::env::Environment;
use crate::common::Result;
use crate::notifier::{ClientOptions, HttpTransport, Transport};

/// Run the fixture, delivering over HTTP
pub async fn run(
    case: Case,
    send: SendMode,
    env: &Environment,
    settings: &HarnessSettings,
) -> Result<()> {
    let transport = HttpTransport::new(settings.delivery.timeout())?;
    run_with_transport(case, send, env, settings, Arc::new(transport)).await
}

/// Run the fixture against the given transport
pub async fn run_with_transport(
    case: Case,
    send: SendMode,
    env: &Environment,
    settings: &HarnessSettings,
    transport: Arc<dyn Transport>,
) -> Result<()> {
    let options = ClientOptions {
        transport: Some(transport),
        session_publish_interval: settings.sessions.publish_interval(),
        delivery_timeout: settings.delivery.timeout(),
    };

    let prepared = cases::run(case, env, options).await?;
    send::dispatch(send, &prepared.client, prepared.sent_error, settings.sessions.settle()).await?;
    prepared.client.shutdown().await?;

    tracing::info!(%case, %send, "Fixture finished");
    Ok(())
}
