//! Cross-instance mutual exclusion for notification fan-out.
//!
//! Two kinds of keys are used:
//!
//! - `stream:<id>` serializes whole fan-outs for a stream and is released
//!   when the fan-out ends.
//! - `stream:<id>:chat:<chat_id>` is a per-recipient claim. It is never
//!   released; its expiry bounds how long a repeat delivery is suppressed.

mod redis;

pub use redis::RedisLockService;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub fn stream_lock_key(stream_id: &str) -> String {
    format!("stream:{stream_id}")
}

pub fn chat_claim_key(stream_id: &str, chat_id: i64) -> String {
    format!("stream:{stream_id}:chat:{chat_id}")
}

/// Proof of ownership of a key. The token identifies this holder so a
/// release never removes a lock someone else took over after expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub key: String,
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::RedisError),

    #[error("lock call timed out after {0:?}")]
    Timeout(Duration),

    #[error("lock service unavailable: {0}")]
    Unavailable(String),
}

/// Distributed lock service with per-key expiry.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Take `key` if nobody holds it. `Ok(None)` means it is held elsewhere.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockLease>, LockError>;

    /// Remove the key if it is still owned by `lease`. Returns whether a key
    /// was removed.
    async fn release(&self, lease: &LockLease) -> Result<bool, LockError>;
}

/// Held per-stream lock. Consumed by [`Coordinator::release_stream`], so it
/// can be released at most once.
#[derive(Debug)]
#[must_use = "a stream lock must be released"]
pub struct StreamLock {
    lease: LockLease,
}

impl StreamLock {
    pub fn key(&self) -> &str {
        &self.lease.key
    }
}

/// Lock policy of the fan-out: how long locks live and how hard to try.
#[derive(Clone)]
pub struct Coordinator {
    locks: Arc<dyn LockService>,
    ttl: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl Coordinator {
    pub fn new(locks: Arc<dyn LockService>, ttl: Duration, retries: u32, retry_delay: Duration) -> Self {
        Self {
            locks,
            ttl,
            retries: retries.max(1),
            retry_delay,
        }
    }

    /// Try to take the per-stream lock, retrying a bounded number of times.
    ///
    /// `Ok(None)` means another holder kept it for every attempt.
    pub async fn lock_stream(&self, stream_id: &str) -> Result<Option<StreamLock>, LockError> {
        let key = stream_lock_key(stream_id);
        for attempt in 1..=self.retries {
            if let Some(lease) = self.locks.try_acquire(&key, self.ttl).await? {
                return Ok(Some(StreamLock { lease }));
            }
            tracing::debug!(key = %key, attempt, "Stream lock held elsewhere");
            if attempt < self.retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        Ok(None)
    }

    /// Returns `false` when the lock had already expired or changed hands.
    pub async fn release_stream(&self, lock: StreamLock) -> Result<bool, LockError> {
        self.locks.release(&lock.lease).await
    }

    /// Single attempt at the per-recipient claim. The claim is left to
    /// expire on its own.
    pub async fn claim_chat(&self, stream_id: &str, chat_id: i64) -> Result<bool, LockError> {
        let key = chat_claim_key(stream_id, chat_id);
        Ok(self.locks.try_acquire(&key, self.ttl).await?.is_some())
    }
}
