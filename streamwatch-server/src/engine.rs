//! Wiring of the detection engine's tasks.
//!
//! Both modes run the notifier. Poll mode adds the subscribed-channel feed
//! and the stream poller; push mode adds the lease-expiring feed and the
//! lease renewer, while candidates arrive through the HTTP callback.

use std::sync::Arc;
use streamwatch_core::config::{ConfigStore, EngineConfig};
use streamwatch_core::coordination::{Coordinator, LockService};
use streamwatch_core::events::{StreamCandidateReceiver, StreamCandidateSender, watched_channel_channel};
use streamwatch_core::messaging::Messenger;
use streamwatch_core::processors::{
    ChannelFeed, FanOut, HubSubscriber, LeaseRenewer, Notifier, RandomTip, StreamPoller, WatchMode,
};
use streamwatch_core::sources::StreamSource;
use streamwatch_core::store::{CompletionStore, SubscriptionStore};
use streamwatch_core::tracker::CompletionTracker;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Poll,
    /// `callback` is the public URL the hub pushes to.
    Push { callback: String },
}

impl Mode {
    pub fn is_push(&self) -> bool {
        matches!(self, Mode::Push { .. })
    }
}

/// Collaborators the engine is built from.
pub struct EngineParts {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub completions: Arc<dyn CompletionStore>,
    pub source: Arc<dyn StreamSource>,
    pub locks: Arc<dyn LockService>,
    pub messenger: Arc<dyn Messenger>,
    pub hub: Arc<dyn HubSubscriber>,
    pub config: ConfigStore<EngineConfig>,
}

pub struct Engine {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Engine {
    /// Spawn every task for `mode`. Lock policy, tip chance and fan-out
    /// concurrency are taken from the configuration at this point.
    pub async fn spawn(
        parts: EngineParts,
        mode: &Mode,
        stream_tx: StreamCandidateSender,
        stream_rx: StreamCandidateReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let config = parts.config.snapshot().await;
        let mut tasks = Vec::new();

        let coordinator = Coordinator::new(
            parts.locks,
            config.lock_ttl,
            config.lock_retries,
            config.lock_retry_delay,
        );
        let fan_out = Arc::new(FanOut::new(
            coordinator,
            CompletionTracker::new(parts.completions),
            parts.subscriptions.clone(),
            parts.messenger,
            Box::new(RandomTip::new(config.timezone_tip_chance)),
        ));
        let notifier = Notifier::new(
            fan_out,
            config.fanout_concurrency,
            stream_rx,
            shutdown_rx.clone(),
        );
        tasks.push(("notifier", tokio::spawn(notifier.run())));

        let (channel_tx, channel_rx) = watched_channel_channel();
        match mode {
            Mode::Poll => {
                let feed = ChannelFeed::new(
                    parts.subscriptions,
                    WatchMode::Subscribed,
                    parts.config.clone(),
                    channel_tx,
                    shutdown_rx.clone(),
                );
                let poller = StreamPoller::new(
                    parts.source,
                    parts.config,
                    channel_rx,
                    stream_tx,
                    shutdown_rx,
                );
                tasks.push(("channel feed", tokio::spawn(feed.run())));
                tasks.push(("stream poller", tokio::spawn(poller.run())));
            }
            Mode::Push { callback } => {
                let feed = ChannelFeed::new(
                    parts.subscriptions,
                    WatchMode::LeaseExpiring,
                    parts.config,
                    channel_tx,
                    shutdown_rx.clone(),
                );
                let renewer = LeaseRenewer::new(parts.hub, callback.clone(), channel_rx, shutdown_rx);
                tasks.push(("channel feed", tokio::spawn(feed.run())));
                tasks.push(("lease renewer", tokio::spawn(renewer.run())));
                // Candidates come from the HTTP callback, which holds its own sender.
                drop(stream_tx);
            }
        }

        tracing::info!(mode = ?mode, tasks = tasks.len(), "Engine started");
        Self { tasks }
    }

    /// Wait for every task to finish.
    pub async fn join(self) {
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = %e, "Engine task failed");
            }
        }
    }
}
