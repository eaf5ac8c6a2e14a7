use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::services::card_delivery::{CardDispatch, CardSender};

/// Creates the bounded queue built cards travel through.
pub fn card_queue(capacity: usize) -> (mpsc::Sender<CardDispatch>, mpsc::Receiver<CardDispatch>) {
    mpsc::channel(capacity.max(1))
}

/// Delivers queued cards one at a time until every sender is dropped.
/// Failed deliveries are logged and not retried.
pub fn start_card_delivery_worker(
    mut receiver: mpsc::Receiver<CardDispatch>,
    sender: Arc<dyn CardSender>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(dispatch) = receiver.recv().await {
            match sender.send_card(&dispatch).await {
                Ok(()) => info!(
                    event_id = dispatch.event_id,
                    user_id = %dispatch.reference.user_id,
                    "card sent"
                ),
                Err(err) => warn!(
                    event_id = dispatch.event_id,
                    user_id = %dispatch.reference.user_id,
                    error = %err,
                    "card delivery failed"
                ),
            }
        }
        info!("card queue closed; delivery worker stopping");
    })
}
