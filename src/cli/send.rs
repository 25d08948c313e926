//! Dispatcher for the `--send` action

use std::time::Duration;

use tracing::{debug, warn};

use crate::commands::SendMode;
use crate::common::Result;
use crate::notifier::{Client, Event, MetaData, NotifyOutcome, StackFrame};

pub const ERROR_MESSAGE: &str = "oops";

/// The event sent by `--send error`
pub fn error_event() -> Event {
    let metadata = MetaData::new()
        .with("Account", "Name", "Company XYZ")
        .with("Account", "Price(dollars)", "1 Million");

    Event::new(ERROR_MESSAGE)
        .with_metadata(metadata)
        .with_frame(StackFrame::new(module_path!(), file!(), line!()))
}

/// Perform the send action unless the case already sent an error
///
/// For sessions, waits `settle` after starting so the tracker gets at least
/// one scheduled publish before the caller shuts the client down.
pub async fn dispatch(
    mode: SendMode,
    client: &Client,
    sent_error: bool,
    settle: Duration,
) -> Result<()> {
    match mode {
        SendMode::Error if sent_error => {
            debug!("Case already sent an error, nothing more to send");
        }
        SendMode::Error => {
            log_outcome(client.notify_sync(error_event()).await);
        }
        SendMode::Session => {
            client.start_session().await?;
            tokio::time::sleep(settle).await;
        }
    }
    Ok(())
}

/// Log the result of a notify; delivery failures are not fatal to the fixture
pub fn log_outcome(result: Result<NotifyOutcome>) {
    match result {
        Ok(NotifyOutcome::Delivered) => debug!("Event delivered"),
        Ok(NotifyOutcome::Suppressed(veto)) => debug!(reason = %veto, "Event suppressed"),
        Ok(NotifyOutcome::Skipped) => debug!("Event skipped for release stage"),
        Err(e) => warn!(error = %e, "Event delivery failed"),
    }
}
