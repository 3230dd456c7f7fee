//! Runtime configuration shared by the engine's long-running tasks.
//!
//! Loading and validating the TOML file is the server crate's job; the
//! types here are the already validated values.

mod config_store;

pub use config_store::ConfigStore;

use std::time::Duration;

/// Pacing, timeout and concurrency knobs of the detection engine.
///
/// Read by the feed and poller loops at the start of every cycle, so a
/// reload through [`ConfigStore::update`] applies without a restart. Lock
/// and client timeouts are fixed when the collaborators are built.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Pause after each channel a poll worker handles.
    pub poll_delay: Duration,
    /// Pause after a failed watch-list query.
    pub feed_error_backoff: Duration,
    /// Pause after a watch-list query that returned nothing.
    pub feed_empty_backoff: Duration,
    /// Minimum length of one lease-renewal cycle.
    pub lease_min_cycle: Duration,
    /// Leases ending within this margin are renewed.
    pub lease_margin: Duration,
    pub lock_ttl: Duration,
    /// Attempts made to take the per-stream lock before giving up.
    pub lock_retries: u32,
    pub lock_retry_delay: Duration,
    pub request_timeout: Duration,
    pub store_timeout: Duration,
    /// Streams notified concurrently.
    pub fanout_concurrency: usize,
    /// Probability of appending the time zone hint to an upcoming message.
    pub timezone_tip_chance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_secs(60),
            feed_error_backoff: Duration::from_secs(10),
            feed_empty_backoff: Duration::from_secs(60),
            lease_min_cycle: Duration::from_secs(60),
            lease_margin: Duration::from_secs(5 * 60),
            lock_ttl: Duration::from_secs(5 * 60),
            lock_retries: 8,
            lock_retry_delay: Duration::from_millis(250),
            request_timeout: Duration::from_secs(5),
            store_timeout: Duration::from_secs(60),
            fanout_concurrency: 8,
            timezone_tip_chance: 0.1,
        }
    }
}
