//! Persistence seams of the engine.
//!
//! Processors and HTTP handlers depend on these traits rather than on the
//! database directly, so tests can substitute in-memory stores.

use crate::entities::StreamPhase;
use crate::entities::channels::{
    Channel, ListActiveChannels, ListLeaseExpiringChannels, StoreChannelLease,
};
use crate::entities::chats::{Chat, GetSubscribedChats};
use crate::entities::done_streams::{GetDoneStream, MarkStreamDone};
use crate::framework::{DatabaseProcessor, StoreError, with_deadline};
use async_trait::async_trait;
use kanau::processor::Processor;
use std::time::Duration;

/// Watch list, chats and hub leases.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Enabled chats subscribed to `channel_id`, in a stable order.
    async fn subscribed_chats(&self, channel_id: &str) -> Result<Vec<Chat>, StoreError>;

    /// Every channel with at least one subscription.
    async fn active_channels(&self) -> Result<Vec<Channel>, StoreError>;

    /// Channels whose lease is unknown or ends within `margin`.
    async fn lease_expiring_channels(&self, margin: Duration) -> Result<Vec<Channel>, StoreError>;

    /// Returns `false` when no channel row matched.
    async fn store_lease(&self, channel_id: &str, lease_seconds: i32) -> Result<bool, StoreError>;
}

/// Per-stream completion flags.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn is_phase_done(&self, stream_id: &str, phase: StreamPhase) -> Result<bool, StoreError>;

    /// Marking `Live` marks `Upcoming` too. Flags never go back to `false`.
    async fn mark_done(&self, stream_id: &str, phase: StreamPhase) -> Result<(), StoreError>;
}

/// Postgres-backed implementation of both store traits. Every call is
/// bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseProcessor,
    timeout: Duration,
}

impl PgStore {
    pub fn new(db: DatabaseProcessor, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn subscribed_chats(&self, channel_id: &str) -> Result<Vec<Chat>, StoreError> {
        let query = GetSubscribedChats {
            channel_id: channel_id.to_owned(),
        };
        with_deadline(self.timeout, self.db.process(query)).await
    }

    async fn active_channels(&self) -> Result<Vec<Channel>, StoreError> {
        with_deadline(self.timeout, self.db.process(ListActiveChannels)).await
    }

    async fn lease_expiring_channels(&self, margin: Duration) -> Result<Vec<Channel>, StoreError> {
        let query = ListLeaseExpiringChannels { margin };
        with_deadline(self.timeout, self.db.process(query)).await
    }

    async fn store_lease(&self, channel_id: &str, lease_seconds: i32) -> Result<bool, StoreError> {
        let update = StoreChannelLease {
            channel_id: channel_id.to_owned(),
            lease_seconds,
        };
        let rows = with_deadline(self.timeout, self.db.process(update)).await?;
        Ok(rows > 0)
    }
}

#[async_trait]
impl CompletionStore for PgStore {
    async fn is_phase_done(&self, stream_id: &str, phase: StreamPhase) -> Result<bool, StoreError> {
        let query = GetDoneStream {
            stream_id: stream_id.to_owned(),
        };
        let record = with_deadline(self.timeout, self.db.process(query)).await?;
        Ok(record.is_some_and(|r| r.is_done(phase)))
    }

    async fn mark_done(&self, stream_id: &str, phase: StreamPhase) -> Result<(), StoreError> {
        let update = MarkStreamDone {
            stream_id: stream_id.to_owned(),
            phase,
        };
        with_deadline(self.timeout, self.db.process(update)).await
    }
}
