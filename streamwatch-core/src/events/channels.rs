//! Event channel factories and handles.

use super::types::{StreamCandidate, WatchedChannel};
use tokio::sync::mpsc;

/// Default buffer size for event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Watch-list entries are handed over one at a time, so a feed re-reads
/// the watch list only once its consumer has caught up.
pub const WATCH_LIST_BUFFER: usize = 1;

pub type WatchedChannelSender = mpsc::Sender<WatchedChannel>;
pub type WatchedChannelReceiver = mpsc::Receiver<WatchedChannel>;

pub type StreamCandidateSender = mpsc::Sender<StreamCandidate>;
pub type StreamCandidateReceiver = mpsc::Receiver<StreamCandidate>;

/// Create a channel carrying watch-list entries from a feed to one consumer.
pub fn watched_channel_channel() -> (WatchedChannelSender, WatchedChannelReceiver) {
    mpsc::channel(WATCH_LIST_BUFFER)
}

/// Create the candidate channel feeding the notifier.
///
/// The sender is cloned for every producer (poll workers, the push endpoint);
/// the channel closes once all of them are gone.
pub fn stream_candidate_channel() -> (StreamCandidateSender, StreamCandidateReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
