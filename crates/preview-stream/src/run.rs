use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::content::SessionOutput;
use crate::errors::PreviewError;
use crate::event::Event;
use crate::generator::Generator;
use crate::request::GenerateRequest;

impl Generator {
    /// Validates the request and runs the session on a spawned task.
    ///
    /// Events are delivered in order through the returned `GenerationStream`.
    /// Dropping the stream cancels the session at its next suspension point,
    /// which drops the upstream body and its connection.
    pub async fn start_stream(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerationStream, PreviewError> {
        self.validate(&request)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let target_id = request.target_id.clone();
        let generator = self.clone();
        tokio::spawn(async move {
            let consumer = tx.clone();
            let mut tx = tx;
            tokio::select! {
                result = generator.run_validated(request, &mut tx) => {
                    let _ = outcome_tx.send(result);
                }
                () = consumer.closed() => {
                    debug!("generation stream dropped, cancelling session");
                }
            }
        });

        Ok(GenerationStream {
            target_id,
            rx,
            outcome_rx,
        })
    }
}

/// Pull-based handle over a spawned generation session.
///
/// Use `next_event()` to consume events as they arrive and `finish()` to
/// obtain the session outcome.
pub struct GenerationStream {
    target_id: String,
    rx: mpsc::UnboundedReceiver<Event>,
    outcome_rx: oneshot::Receiver<Result<SessionOutput, PreviewError>>,
}

impl GenerationStream {
    /// Target this session generates for.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Waits for the next event. Returns `None` once the session has ended
    /// and every event has been delivered.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Drains any remaining events and returns the session outcome.
    pub async fn finish(mut self) -> Result<SessionOutput, PreviewError> {
        while self.rx.recv().await.is_some() {}
        match self.outcome_rx.await {
            Ok(result) => result,
            Err(_) => Err(PreviewError::Detached),
        }
    }
}
