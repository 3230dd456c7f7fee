//! Values flowing between the engine's tasks.
//!
//! # Flow
//!
//! 1. `ChannelFeed` emits `WatchedChannel` -> `StreamPoller` (polling mode)
//!    or `LeaseRenewer` (push mode)
//! 2. `StreamPoller` and the push endpoint emit `StreamCandidate` -> `Notifier`
//!
//! Candidates are re-observed until their phase is marked done, so a dropped
//! candidate is picked up again on a later cycle.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, StreamCandidateReceiver, StreamCandidateSender, WATCH_LIST_BUFFER,
    WatchedChannelReceiver, WatchedChannelSender, stream_candidate_channel,
    watched_channel_channel,
};

pub use types::{ChannelHeader, StreamCandidate, StreamStatus, WatchedChannel};
