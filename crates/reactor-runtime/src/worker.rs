//! Sequenced prediction worker.
//!
//! Requests go through one queue into one tokio task, so results come back
//! in submission order no matter how long each backend call takes.

use std::sync::Arc;

use reactor_core::error::{DashboardError, Result};
use reactor_core::models::{PredictionResult, ReactionConditions};
use tokio::sync::mpsc;

use crate::prediction::{build_result, PredictionSource};

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of one submitted request.
#[derive(Debug)]
pub enum PredictionEvent {
    Completed {
        request_id: u64,
        result: PredictionResult,
    },
    Failed {
        request_id: u64,
        error: DashboardError,
    },
}

impl PredictionEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Completed { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }
}

// ── PredictionWorker ──────────────────────────────────────────────────────────

pub struct PredictionWorker {
    source: Arc<dyn PredictionSource>,
}

impl PredictionWorker {
    pub fn new(source: Arc<dyn PredictionSource>) -> Self {
        Self { source }
    }

    /// Spawn the worker task. Returns the submission handle and the event
    /// stream.
    pub fn start(self) -> (PredictionHandle, mpsc::Receiver<PredictionEvent>) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.run(request_rx, event_tx).await;
        });

        (
            PredictionHandle {
                requests: request_tx,
                next_id: 1,
                pending: 0,
                handle,
            },
            event_rx,
        )
    }

    async fn run(
        self,
        mut requests: mpsc::UnboundedReceiver<(u64, ReactionConditions)>,
        events: mpsc::Sender<PredictionEvent>,
    ) {
        while let Some((request_id, inputs)) = requests.recv().await {
            tracing::debug!(request_id, source = self.source.name(), "running prediction");
            let event = match self.source.predict(&inputs).await {
                Ok(outputs) => PredictionEvent::Completed {
                    request_id,
                    result: build_result(inputs, outputs),
                },
                Err(error) => {
                    tracing::warn!(request_id, %error, "prediction failed");
                    PredictionEvent::Failed { request_id, error }
                }
            };
            if events.send(event).await.is_err() {
                tracing::debug!("prediction event channel closed; exiting worker");
                break;
            }
        }
    }
}

// ── PredictionHandle ──────────────────────────────────────────────────────────

/// Submission side of a running [`PredictionWorker`].
pub struct PredictionHandle {
    requests: mpsc::UnboundedSender<(u64, ReactionConditions)>,
    next_id: u64,
    pending: usize,
    handle: tokio::task::JoinHandle<()>,
}

impl PredictionHandle {
    /// Queue a request and return its id.
    pub fn submit(&mut self, inputs: ReactionConditions) -> Result<u64> {
        let id = self.next_id;
        self.requests
            .send((id, inputs))
            .map_err(|_| DashboardError::Other(anyhow::anyhow!("prediction worker has stopped")))?;
        self.next_id += 1;
        self.pending += 1;
        Ok(id)
    }

    /// Record that an event for a previously submitted request arrived.
    pub fn resolved(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    /// Requests submitted but not yet resolved.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
