//! StreamPoller processor.
//!
//! Polling-mode event source. For each channel from the watch list:
//! 1. search for live broadcasts and emit each hit
//! 2. search for upcoming broadcasts, look up each hit's scheduled start
//!    and emit it
//! 3. wait `poll_delay` before taking the next channel
//!
//! A failed search or lookup is logged and skipped; the channel comes round
//! again on the next watch-list cycle.

use crate::config::{ConfigStore, EngineConfig};
use crate::events::{
    ChannelHeader, StreamCandidate, StreamCandidateSender, StreamStatus, WatchedChannel,
    WatchedChannelReceiver,
};
use crate::sources::{SearchHit, StreamSource, scheduled_start_of};
use crate::utils::pacing::{shutdown_requested, sleep_or_shutdown};
use std::sync::Arc;
use streamwatch_sdk::objects::EventType;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct StreamPoller {
    source: Arc<dyn StreamSource>,
    config: ConfigStore<EngineConfig>,
    channel_rx: WatchedChannelReceiver,
    stream_tx: StreamCandidateSender,
    shutdown_rx: watch::Receiver<bool>,
}

impl StreamPoller {
    pub fn new(
        source: Arc<dyn StreamSource>,
        config: ConfigStore<EngineConfig>,
        channel_rx: WatchedChannelReceiver,
        stream_tx: StreamCandidateSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            config,
            channel_rx,
            stream_tx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        info!("StreamPoller started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown_rx) => {
                    info!("StreamPoller received shutdown signal");
                    break;
                }

                Some(channel) = self.channel_rx.recv() => {
                    let candidates = self.poll_channel(&channel).await;
                    debug!(channel_id = %channel.id, count = candidates.len(), "Polled channel");
                    for candidate in candidates {
                        if self.stream_tx.send(candidate).await.is_err() {
                            info!("Stream candidate channel closed");
                            return;
                        }
                    }
                    let delay = self.config.snapshot().await.poll_delay;
                    if !sleep_or_shutdown(&mut self.shutdown_rx, delay).await {
                        info!("StreamPoller received shutdown signal");
                        break;
                    }
                }

                else => {
                    info!("Watch list channel closed");
                    break;
                }
            }
        }

        info!("StreamPoller shutdown complete");
    }

    /// Live and upcoming candidates of one channel, live first.
    pub async fn poll_channel(&self, channel: &WatchedChannel) -> Vec<StreamCandidate> {
        let mut candidates = Vec::new();

        match self.source.search(&channel.id, EventType::Live).await {
            Ok(hits) => {
                candidates.extend(
                    hits.into_iter()
                        .map(|hit| candidate(channel, hit, StreamStatus::Live)),
                );
            }
            Err(e) => {
                warn!(channel_id = %channel.id, error = %e, "Live search failed");
            }
        }

        let upcoming = match self.source.search(&channel.id, EventType::Upcoming).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(channel_id = %channel.id, error = %e, "Upcoming search failed");
                return candidates;
            }
        };
        for hit in upcoming {
            let scheduled_start = match self.source.video(&hit.video_id).await {
                Ok(video) => scheduled_start_of(&video),
                Err(e) => Err(e),
            };
            match scheduled_start {
                Ok(scheduled_start) => {
                    candidates.push(candidate(
                        channel,
                        hit,
                        StreamStatus::Upcoming { scheduled_start },
                    ));
                }
                Err(e) => {
                    warn!(
                        channel_id = %channel.id,
                        video_id = %hit.video_id,
                        error = %e,
                        "Skipping upcoming stream"
                    );
                }
            }
        }
        candidates
    }
}

fn candidate(channel: &WatchedChannel, hit: SearchHit, status: StreamStatus) -> StreamCandidate {
    StreamCandidate {
        id: hit.video_id,
        channel: ChannelHeader {
            id: channel.id.clone(),
            title: channel.title.clone(),
        },
        title: hit.title,
        status,
    }
}
