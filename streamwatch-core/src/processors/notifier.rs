//! Notifier processor.
//!
//! Turns stream candidates into announcements. Each candidate is handled by
//! [`FanOut::notify_about_stream`]:
//!
//! 1. take the per-stream lock (bounded retries), or give up
//! 2. skip streams whose phase is already done
//! 3. for each subscribed chat, in order: take the per-chat claim, compose
//!    and send; failures are logged and do not stop the fan-out
//! 4. mark the phase done once every chat was attempted
//! 5. release the per-stream lock, on every path
//!
//! A crash between 3 and 4 leaves the phase open; the next attempt skips the
//! chats whose claims have not expired yet.

use crate::coordination::Coordinator;
use crate::entities::chats::Chat;
use crate::events::{StreamCandidate, StreamCandidateReceiver, StreamStatus};
use crate::messaging::Messenger;
use crate::store::SubscriptionStore;
use crate::templates::{live_message, upcoming_message};
use crate::tracker::CompletionTracker;
use crate::utils::pacing::shutdown_requested;
use crate::utils::timezone::TimezoneCache;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Per-chat tally of one fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub sent: usize,
    /// Chats whose claim was still held from an earlier attempt.
    pub already_claimed: usize,
    pub failed: usize,
    pub marked_done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanOutOutcome {
    /// Another holder kept the stream lock through every retry.
    Contended,
    AlreadyDone,
    /// Nothing was sent; the stream is retried when observed again.
    Aborted,
    Delivered(FanOutReport),
}

/// Whether to add the time zone hint to a message for a chat without one.
pub trait TipPolicy: Send + Sync {
    fn show_tip(&self) -> bool;
}

/// Shows the hint with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomTip {
    chance: f64,
}

impl RandomTip {
    pub fn new(chance: f64) -> Self {
        Self {
            chance: if chance.is_finite() { chance.clamp(0.0, 1.0) } else { 0.0 },
        }
    }
}

impl TipPolicy for RandomTip {
    fn show_tip(&self) -> bool {
        rand::random_bool(self.chance)
    }
}

/// Everything a single fan-out needs. Shared by all in-flight fan-outs.
pub struct FanOut {
    coordinator: Coordinator,
    tracker: CompletionTracker,
    store: Arc<dyn SubscriptionStore>,
    messenger: Arc<dyn Messenger>,
    timezones: TimezoneCache,
    tips: Box<dyn TipPolicy>,
}

impl FanOut {
    pub fn new(
        coordinator: Coordinator,
        tracker: CompletionTracker,
        store: Arc<dyn SubscriptionStore>,
        messenger: Arc<dyn Messenger>,
        tips: Box<dyn TipPolicy>,
    ) -> Self {
        Self {
            coordinator,
            tracker,
            store,
            messenger,
            timezones: TimezoneCache::new(),
            tips,
        }
    }

    pub async fn notify_about_stream(&self, stream: &StreamCandidate) -> FanOutOutcome {
        let lock = match self.coordinator.lock_stream(&stream.id).await {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                debug!(stream_id = %stream.id, "Stream is being handled elsewhere");
                return FanOutOutcome::Contended;
            }
            Err(e) => {
                error!(stream_id = %stream.id, error = %e, "Failed to lock stream");
                return FanOutOutcome::Aborted;
            }
        };

        let outcome = self.deliver(stream).await;

        let key = lock.key().to_owned();
        match self.coordinator.release_stream(lock).await {
            Ok(true) => {}
            Ok(false) => warn!(key = %key, "Stream lock expired before release"),
            Err(e) => error!(key = %key, error = %e, "Failed to release stream lock"),
        }
        outcome
    }

    async fn deliver(&self, stream: &StreamCandidate) -> FanOutOutcome {
        if self.tracker.is_done(stream).await {
            debug!(stream_id = %stream.id, phase = %stream.phase(), "Stream already announced");
            return FanOutOutcome::AlreadyDone;
        }

        let chats = match self.store.subscribed_chats(&stream.channel.id).await {
            Ok(chats) => chats,
            Err(e) => {
                error!(
                    stream_id = %stream.id,
                    channel_id = %stream.channel.id,
                    error = %e,
                    "Failed to load subscribed chats"
                );
                return FanOutOutcome::Aborted;
            }
        };

        let mut report = FanOutReport::default();
        for chat in &chats {
            match self.coordinator.claim_chat(&stream.id, chat.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(stream_id = %stream.id, chat_id = chat.id, "Chat already claimed");
                    report.already_claimed += 1;
                    continue;
                }
                Err(e) => {
                    warn!(stream_id = %stream.id, chat_id = chat.id, error = %e, "Failed to claim chat");
                    report.failed += 1;
                    continue;
                }
            }
            let text = self.compose(chat, stream).await;
            match self.messenger.send_text(chat.id, &text).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(stream_id = %stream.id, chat_id = chat.id, error = %e, "Failed to send announcement");
                    report.failed += 1;
                }
            }
        }

        match self.tracker.mark_done(&stream.id, stream.phase()).await {
            Ok(()) => report.marked_done = true,
            Err(e) => {
                error!(stream_id = %stream.id, phase = %stream.phase(), error = %e, "Failed to mark stream done");
            }
        }

        info!(
            stream_id = %stream.id,
            phase = %stream.phase(),
            sent = report.sent,
            already_claimed = report.already_claimed,
            failed = report.failed,
            "Stream announced"
        );
        FanOutOutcome::Delivered(report)
    }

    async fn compose(&self, chat: &Chat, stream: &StreamCandidate) -> String {
        match stream.status {
            StreamStatus::Live => live_message(&stream.channel.title, &stream.title, &stream.id),
            StreamStatus::Upcoming { scheduled_start } => {
                let when = self
                    .timezones
                    .render(scheduled_start, chat.time_zone.as_deref())
                    .await;
                let with_tip = chat.time_zone.is_none() && self.tips.show_tip();
                upcoming_message(&stream.channel.title, &stream.title, &when, &stream.id, with_tip)
            }
        }
    }
}

/// Runs fan-outs for incoming candidates, at most `concurrency` at a time.
pub struct Notifier {
    fan_out: Arc<FanOut>,
    concurrency: usize,
    stream_rx: StreamCandidateReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl Notifier {
    pub fn new(
        fan_out: Arc<FanOut>,
        concurrency: usize,
        stream_rx: StreamCandidateReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fan_out,
            concurrency: concurrency.max(1),
            stream_rx,
            shutdown_rx,
        }
    }

    /// Stops taking candidates on shutdown or when every producer is gone,
    /// then waits for in-flight fan-outs to finish.
    pub async fn run(mut self) {
        info!(concurrency = self.concurrency, "Notifier started");
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown_rx) => {
                    info!("Notifier received shutdown signal");
                    break;
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Fan-out task failed");
                    }
                }

                received = self.stream_rx.recv() => {
                    let Some(stream) = received else {
                        info!("Stream candidate channel closed");
                        break;
                    };
                    let Ok(permit) = permits.clone().acquire_owned().await else {
                        break;
                    };
                    let fan_out = self.fan_out.clone();
                    in_flight.spawn(async move {
                        let _permit = permit;
                        fan_out.notify_about_stream(&stream).await
                    });
                }
            }
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Waiting for in-flight fan-outs");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Fan-out task failed");
            }
        }
        info!("Notifier shutdown complete");
    }
}
