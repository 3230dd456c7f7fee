//! ChannelFeed processor.
//!
//! Re-reads the watch list cycle after cycle and hands each channel to one
//! consumer:
//! - `WatchMode::Subscribed` emits every subscribed channel (polling)
//! - `WatchMode::LeaseExpiring` emits channels whose hub lease needs
//!   renewing, and stretches each cycle to at least `lease_min_cycle`
//!
//! Failed queries back off for `feed_error_backoff`, empty results for
//! `feed_empty_backoff`. Pacing values are re-read every cycle.

use crate::config::{ConfigStore, EngineConfig};
use crate::entities::channels::Channel;
use crate::events::{WatchedChannel, WatchedChannelSender};
use crate::framework::StoreError;
use crate::store::SubscriptionStore;
use crate::utils::pacing::{remaining_cycle, shutdown_requested, sleep_or_shutdown};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    Subscribed,
    LeaseExpiring,
}

impl std::fmt::Display for WatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchMode::Subscribed => f.write_str("subscribed"),
            WatchMode::LeaseExpiring => f.write_str("lease-expiring"),
        }
    }
}

pub struct ChannelFeed {
    store: Arc<dyn SubscriptionStore>,
    mode: WatchMode,
    config: ConfigStore<EngineConfig>,
    channel_tx: WatchedChannelSender,
    shutdown_rx: watch::Receiver<bool>,
}

impl ChannelFeed {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        mode: WatchMode,
        config: ConfigStore<EngineConfig>,
        channel_tx: WatchedChannelSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            mode,
            config,
            channel_tx,
            shutdown_rx,
        }
    }

    /// Run until shutdown or until the consumer goes away. Dropping the feed
    /// closes the channel, which in turn stops the consumer.
    pub async fn run(mut self) {
        info!(mode = %self.mode, "ChannelFeed started");
        while self.run_cycle().await {}
        info!(mode = %self.mode, "ChannelFeed shutdown complete");
    }

    /// One pass over the watch list. Returns `false` once the feed must stop.
    async fn run_cycle(&mut self) -> bool {
        if *self.shutdown_rx.borrow() {
            info!(mode = %self.mode, "ChannelFeed received shutdown signal");
            return false;
        }
        let started = Instant::now();
        let config = self.config.snapshot().await;

        let channels = match self.fetch(&config).await {
            Ok(channels) => channels,
            Err(e) => {
                error!(mode = %self.mode, error = %e, "Failed to query watch list");
                return sleep_or_shutdown(&mut self.shutdown_rx, config.feed_error_backoff).await;
            }
        };

        if channels.is_empty() {
            debug!(mode = %self.mode, "Watch list is empty");
            if !sleep_or_shutdown(&mut self.shutdown_rx, config.feed_empty_backoff).await {
                return false;
            }
        }

        for channel in channels {
            if *self.shutdown_rx.borrow() {
                info!(mode = %self.mode, "ChannelFeed received shutdown signal");
                return false;
            }
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown_rx) => {
                    info!(mode = %self.mode, "ChannelFeed received shutdown signal");
                    return false;
                }

                sent = self.channel_tx.send(WatchedChannel::from(channel)) => {
                    if sent.is_err() {
                        info!(mode = %self.mode, "Watch list consumer closed");
                        return false;
                    }
                }
            }
        }

        if self.mode == WatchMode::LeaseExpiring {
            let rest = remaining_cycle(started.elapsed(), config.lease_min_cycle);
            return sleep_or_shutdown(&mut self.shutdown_rx, rest).await;
        }
        true
    }

    async fn fetch(&self, config: &EngineConfig) -> Result<Vec<Channel>, StoreError> {
        match self.mode {
            WatchMode::Subscribed => self.store.active_channels().await,
            WatchMode::LeaseExpiring => self.store.lease_expiring_channels(config.lease_margin).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::watched_channel_channel;
    use crate::testing::{MemoryStore, chat, channel};
    use std::time::Duration;
    use time::OffsetDateTime;

    fn feed(
        store: Arc<MemoryStore>,
        mode: WatchMode,
    ) -> (
        ChannelFeed,
        crate::events::WatchedChannelReceiver,
        watch::Sender<bool>,
    ) {
        let (tx, rx) = watched_channel_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let feed = ChannelFeed::new(
            store,
            mode,
            ConfigStore::new(EngineConfig::default()),
            tx,
            shutdown_rx,
        );
        (feed, rx, shutdown_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribed_mode_repeats_watch_list() {
        let store = Arc::new(MemoryStore::default());
        let now = OffsetDateTime::now_utc();
        store.add_channel(channel("UC1", None, now));
        store.add_channel(channel("UC2", None, now));
        store.add_channel(channel("UC3", None, now));
        store.subscribe("UC1", chat(1, None));
        store.subscribe("UC2", chat(1, None));

        let (feed, mut rx, _shutdown_tx) = feed(store, WatchMode::Subscribed);
        let handle = tokio::spawn(feed.run());

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rx.recv().await.unwrap().id);
        }
        assert_eq!(seen, ["UC1", "UC2", "UC1", "UC2"]);

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_lease_mode_skips_fresh_leases() {
        let store = Arc::new(MemoryStore::default());
        let now = OffsetDateTime::now_utc();
        store.add_channel(channel("UC1", Some(432_000), now));
        store.add_channel(channel("UC2", Some(600), now - time::Duration::seconds(500)));
        store.add_channel(channel("UC3", None, now));
        for id in ["UC1", "UC2", "UC3"] {
            store.subscribe(id, chat(1, None));
        }

        let (feed, mut rx, shutdown_tx) = feed(store, WatchMode::LeaseExpiring);
        let handle = tokio::spawn(feed.run());

        assert_eq!(rx.recv().await.unwrap().id, "UC2");
        assert_eq!(rx.recv().await.unwrap().id, "UC3");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_lease_mode_enforces_minimum_cycle() {
        let store = Arc::new(MemoryStore::default());
        store.add_channel(channel("UC1", None, OffsetDateTime::now_utc()));
        store.subscribe("UC1", chat(1, None));

        let (feed, mut rx, _shutdown_tx) = feed(store.clone(), WatchMode::LeaseExpiring);
        let handle = tokio::spawn(feed.run());

        let start = Instant::now();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(60));

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failure_backs_off() {
        let store = Arc::new(MemoryStore::default());
        store.fail_channel_reads(true);

        let (feed, _rx, shutdown_tx) = feed(store.clone(), WatchMode::Subscribed);
        let handle = tokio::spawn(feed.run());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(store.channel_queries(), 3);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_channel() {
        let store = Arc::new(MemoryStore::default());

        let (feed, mut rx, shutdown_tx) = feed(store, WatchMode::Subscribed);
        let handle = tokio::spawn(feed.run());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
