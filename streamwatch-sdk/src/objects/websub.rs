//! WebSub (PubSubHubbub) subscription objects for YouTube channel feeds.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Public hub that relays YouTube upload feeds.
pub const HUB_URL: &str = "https://pubsubhubbub.appspot.com/subscribe";

/// Path on this service that receives verification requests and feed pushes.
pub const CALLBACK_PATH: &str = "/video";

const TOPIC_PREFIX: &str = "https://www.youtube.com/xml/feeds/videos.xml?channel_id=";

static TOPIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.youtube\.com/xml/feeds/videos\.xml\?channel_id=(.+)$")
        .expect("valid topic pattern")
});

/// Feed URL the hub is asked to watch for a channel.
pub fn topic_for_channel(channel_id: &str) -> String {
    format!("{TOPIC_PREFIX}{channel_id}")
}

/// Extract the channel id from a topic URL, if it matches the feed pattern.
pub fn channel_from_topic(topic: &str) -> Option<&str> {
    TOPIC_PATTERN
        .captures(topic)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Callback URL the hub pushes to, built from this service's public host.
pub fn callback_url(public_host: &str) -> String {
    format!("http://{public_host}{CALLBACK_PATH}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubMode {
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubVerify {
    Async,
    Sync,
}

/// Form body of a subscribe request sent to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "hub.mode")]
    pub mode: HubMode,
    #[serde(rename = "hub.topic")]
    pub topic: String,
    #[serde(rename = "hub.callback")]
    pub callback: String,
    #[serde(rename = "hub.verify")]
    pub verify: HubVerify,
}

impl SubscribeRequest {
    /// Asynchronously verified subscription to a channel's upload feed.
    pub fn subscribe(channel_id: &str, callback: impl Into<String>) -> Self {
        Self {
            mode: HubMode::Subscribe,
            topic: topic_for_channel(channel_id),
            callback: callback.into(),
            verify: HubVerify::Async,
        }
    }
}

/// Query string of the hub's verification-of-intent request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerificationQuery {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.topic", default)]
    pub topic: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
    #[serde(rename = "hub.lease_seconds", default)]
    pub lease_seconds: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("unexpected hub.mode: {0:?}")]
    WrongMode(Option<String>),
    #[error("topic does not match the channel feed pattern: {0:?}")]
    TopicMismatch(Option<String>),
    #[error("missing hub.challenge")]
    MissingChallenge,
    #[error("invalid hub.lease_seconds: {0:?}")]
    InvalidLease(Option<String>),
}

/// A verification request that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSubscription {
    pub channel_id: String,
    pub lease_seconds: i32,
    pub challenge: String,
}

impl VerificationQuery {
    pub fn validate(self) -> Result<VerifiedSubscription, VerificationError> {
        if self.mode.as_deref() != Some("subscribe") {
            return Err(VerificationError::WrongMode(self.mode));
        }
        let Some(channel_id) = self.topic.as_deref().and_then(channel_from_topic) else {
            return Err(VerificationError::TopicMismatch(self.topic));
        };
        let channel_id = channel_id.to_owned();
        let lease_seconds = match self.lease_seconds.as_deref().map(str::parse::<i32>) {
            Some(Ok(lease)) if lease > 0 => lease,
            _ => return Err(VerificationError::InvalidLease(self.lease_seconds)),
        };
        let challenge = self.challenge.ok_or(VerificationError::MissingChallenge)?;
        Ok(VerifiedSubscription {
            channel_id,
            lease_seconds,
            challenge,
        })
    }
}
