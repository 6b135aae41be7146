use std::sync::Arc;

use shuxin_core::DecisionRequest;
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::{DecisionClient, DecisionOutcome};

#[derive(Debug, Clone)]
pub struct DecisionJob {
    pub request_id: u64,
    pub request: DecisionRequest,
}

/// Sent exactly once for every job that was not superseded.
#[derive(Debug, Clone)]
pub struct DecisionEvent {
    pub request_id: u64,
    pub outcome: DecisionOutcome,
}

/// Serve decision jobs one at a time. A newer job aborts the one in flight,
/// so a superseded request never reports back.
pub async fn run_worker(
    client: Arc<DecisionClient>,
    mut rx: mpsc::UnboundedReceiver<DecisionJob>,
    tx: std::sync::mpsc::Sender<DecisionEvent>,
) {
    let mut current: Option<tokio::task::JoinHandle<()>> = None;

    while let Some(job) = rx.recv().await {
        // cancel in-flight
        if let Some(h) = current.take() {
            if !h.is_finished() {
                debug!(request_id = job.request_id, "superseding in-flight decision request");
            }
            h.abort();
        }

        let client = client.clone();
        let tx2 = tx.clone();
        current = Some(tokio::spawn(async move {
            let outcome = client.decide(&job.request).await;
            let _ = tx2.send(DecisionEvent {
                request_id: job.request_id,
                outcome,
            });
        }));
    }

    if let Some(h) = current.take() {
        h.abort();
    }
}

/// Start the worker on the current runtime and return both channel ends.
pub fn spawn_worker(
    client: DecisionClient,
) -> (
    mpsc::UnboundedSender<DecisionJob>,
    std::sync::mpsc::Receiver<DecisionEvent>,
) {
    let (job_tx, job_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = std::sync::mpsc::channel();
    tokio::spawn(run_worker(Arc::new(client), job_rx, event_tx));
    (job_tx, event_rx)
}
