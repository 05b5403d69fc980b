use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{error, info, instrument, warn};

use super::intake::{IntakeOutcome, IntakePipeline};
use crate::error::{DeskError, Result};
use crate::models::TicketRequest;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Messages that can be sent to the intake actor.
#[derive(Debug)]
pub enum IntakeMessage {
    /// Run one ticket through the pipeline.
    Intake {
        request: TicketRequest,
        /// A channel to send the outcome back. Dropping the receiver abandons the intake.
        responder: oneshot::Sender<Result<IntakeOutcome>>,
    },
    /// Stop accepting requests. Intakes already running finish on their own tasks.
    Shutdown,
}

/// A handle to the intake actor.
///
/// This is the entry point the request layer talks to. Every submitted ticket runs on
/// its own task, so a slow assistant call on one ticket never holds up another.
#[derive(Clone)]
pub struct IntakeHandle {
    sender: mpsc::Sender<IntakeMessage>,
    request_timeout: Duration,
}

impl IntakeHandle {
    pub fn new(pipeline: Arc<IntakePipeline>) -> Self {
        Self::with_timeout(pipeline, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Spawns the actor. `request_timeout` bounds how long `submit` waits for an answer.
    pub fn with_timeout(pipeline: Arc<IntakePipeline>, request_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let runner = IntakeRunner { receiver, pipeline };
        tokio::spawn(async move { runner.run().await });
        Self {
            sender,
            request_timeout,
        }
    }

    /// Submits a ticket and waits for its outcome.
    ///
    /// If the wait times out the receiver is dropped, which cancels the in-flight intake.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn submit(&self, request: TicketRequest) -> Result<IntakeOutcome> {
        let (send, recv) = oneshot::channel();
        let msg = IntakeMessage::Intake {
            request,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| DeskError::Internal(e.to_string()))?;
        timeout(self.request_timeout, recv)
            .await?
            .map_err(|e| DeskError::Internal(e.to_string()))?
    }

    /// Submits every ticket at once and waits for all of them. Results keep request order.
    pub async fn submit_batch(&self, requests: Vec<TicketRequest>) -> Vec<Result<IntakeOutcome>> {
        join_all(requests.into_iter().map(|request| self.submit(request))).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(IntakeMessage::Shutdown)
            .await
            .map_err(|e| DeskError::Internal(e.to_string()))
    }
}

// --- Actor Runner ---
struct IntakeRunner {
    receiver: mpsc::Receiver<IntakeMessage>,
    pipeline: Arc<IntakePipeline>,
}

impl IntakeRunner {
    async fn run(mut self) {
        info!("Intake actor started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                IntakeMessage::Intake { request, responder } => {
                    let pipeline = Arc::clone(&self.pipeline);
                    tokio::spawn(run_intake(pipeline, request, responder));
                }
                IntakeMessage::Shutdown => break,
            }
        }
        info!("Intake actor stopped");
    }
}

async fn run_intake(
    pipeline: Arc<IntakePipeline>,
    request: TicketRequest,
    mut responder: oneshot::Sender<Result<IntakeOutcome>>,
) {
    let result = tokio::select! {
        result = pipeline.intake(request) => Some(result),
        _ = responder.closed() => None,
    };

    match result {
        Some(result) => {
            if let Err(e) = &result {
                error!("Error processing ticket: {}", e);
            }
            let _ = responder.send(result);
        }
        None => warn!("Caller went away, abandoning intake"),
    }
}
