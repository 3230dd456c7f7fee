use crate::entities::StreamPhase;
use crate::events::StreamCandidate;
use crate::framework::StoreError;
use crate::store::CompletionStore;
use std::sync::Arc;

/// Answers "has this stream's phase already been announced?".
#[derive(Clone)]
pub struct CompletionTracker {
    store: Arc<dyn CompletionStore>,
}

impl CompletionTracker {
    pub fn new(store: Arc<dyn CompletionStore>) -> Self {
        Self { store }
    }

    /// A failed lookup counts as done: skipping a notification is preferred
    /// over sending a duplicate. The stream is seen again on a later cycle.
    pub async fn is_done(&self, stream: &StreamCandidate) -> bool {
        match self.store.is_phase_done(&stream.id, stream.phase()).await {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(
                    stream_id = %stream.id,
                    phase = %stream.phase(),
                    error = %e,
                    "Completion lookup failed, treating stream as done"
                );
                true
            }
        }
    }

    pub async fn mark_done(&self, stream_id: &str, phase: StreamPhase) -> Result<(), StoreError> {
        self.store.mark_done(stream_id, phase).await
    }
}
