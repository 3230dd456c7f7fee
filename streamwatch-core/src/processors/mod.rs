//! Long-running tasks of the detection engine.
//!
//! - `ChannelFeed`: reads the watch list, emits `WatchedChannel`
//! - `StreamPoller`: receives `WatchedChannel`, emits `StreamCandidate`
//! - `LeaseRenewer`: receives `WatchedChannel`, renews hub subscriptions
//! - `Notifier`: receives `StreamCandidate`, fans out announcements

pub mod channel_feed;
pub mod lease_renewer;
pub mod notifier;
pub mod stream_poller;

pub use channel_feed::{ChannelFeed, WatchMode};
pub use lease_renewer::{HttpHubSubscriber, HubSubscriber, LeaseRenewer, RenewError};
pub use notifier::{FanOut, FanOutOutcome, FanOutReport, Notifier, RandomTip, TipPolicy};
pub use stream_poller::StreamPoller;
