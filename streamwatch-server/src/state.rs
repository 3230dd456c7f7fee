//! Application state shared across all request handlers.

use std::sync::Arc;
use streamwatch_core::events::StreamCandidateSender;
use streamwatch_core::sources::StreamSource;
use streamwatch_core::store::SubscriptionStore;

/// Cheap to clone; everything is behind `Arc` or is a channel handle.
#[derive(Clone)]
pub struct AppState {
    /// Lease bookkeeping for the hub verification handshake.
    pub store: Arc<dyn SubscriptionStore>,
    /// Detail lookups for pushed video ids.
    pub source: Arc<dyn StreamSource>,
    /// Queue feeding the notifier.
    pub stream_tx: StreamCandidateSender,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        source: Arc<dyn StreamSource>,
        stream_tx: StreamCandidateSender,
    ) -> Self {
        Self {
            store,
            source,
            stream_tx,
        }
    }
}
