/// Trigger adapter: turns database notifications about new readings into
/// independent advisor invocations
use futures_util::{stream, StreamExt};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_postgres::AsyncMessage;

use crate::advisor::{AdviceSink, Advisor, ReadingLog};
use crate::database::connect_with_retry;
use crate::error::{AdvisorError, Result};
use crate::models::Reading;

/// Parse one notification payload and spawn an invocation for it.
///
/// Returns `None` when the payload is not a valid reading; nothing is
/// spawned and no advice is written in that case.
pub fn dispatch<L, S>(advisor: &Arc<Advisor<L, S>>, payload: &str) -> Option<JoinHandle<()>>
where
    L: ReadingLog + 'static,
    S: AdviceSink + 'static,
{
    let reading = match Reading::from_json(payload) {
        Ok(reading) => reading,
        Err(e) => {
            warn!("Dropping malformed reading notification: {}", e);
            return None;
        }
    };

    let advisor = Arc::clone(advisor);
    Some(tokio::spawn(async move {
        let timestamp = reading.timestamp;
        if let Err(e) = advisor.on_new_reading(reading).await {
            error!("Failed to generate advice for reading {}: {}", timestamp, e);
        }
    }))
}

/// Listen for new readings on `channel` until the connection ends.
///
/// Only returns on failure; a closed notification stream is
/// `AdvisorError::StreamClosed`.
pub async fn run_listener<L, S>(
    database_url: &str,
    channel: &str,
    advisor: Arc<Advisor<L, S>>,
) -> Result<()>
where
    L: ReadingLog + 'static,
    S: AdviceSink + 'static,
{
    let (client, mut connection) = connect_with_retry(database_url).await?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Forward notifications from the connection driver
    let driver = tokio::spawn(async move {
        let messages = stream::poll_fn(move |cx| connection.poll_message(cx));
        futures_util::pin_mut!(messages);

        while let Some(message) = messages.next().await {
            match message {
                Ok(AsyncMessage::Notification(notification)) => {
                    if tx.send(notification).is_err() {
                        break;
                    }
                }
                Ok(AsyncMessage::Notice(notice)) => debug!("Database notice: {}", notice),
                Ok(_) => {}
                Err(e) => {
                    error!("Listener connection error: {}", e);
                    break;
                }
            }
        }
    });

    client.batch_execute(&format!("LISTEN {}", channel)).await?;
    info!("Listening for new readings on channel '{}'", channel);

    while let Some(notification) = rx.recv().await {
        debug!(
            "Notification from backend {} on '{}'",
            notification.process_id(),
            notification.channel()
        );
        dispatch(&advisor, notification.payload());
    }

    driver.abort();
    Err(AdvisorError::StreamClosed)
}
