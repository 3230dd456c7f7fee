//! Lookups against the video platform.
//!
//! Both the polling path and the push path funnel through [`StreamSource`];
//! [`classify_video`] turns a detail lookup into a [`StreamCandidate`] or a
//! reason it is not one.

mod youtube;

pub use youtube::YoutubeSource;

use crate::events::{ChannelHeader, StreamCandidate, StreamStatus};
use async_trait::async_trait;
use std::time::Duration;
use streamwatch_sdk::client::ClientError;
use streamwatch_sdk::objects::{EventType, LiveBroadcastContent, Video};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] ClientError),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The video never was a live broadcast.
    #[error("video {0} is not a stream")]
    NotStream(String),

    /// A stream that already ended or was never scheduled.
    #[error("video {0} is neither live nor upcoming")]
    NotLiveOrUpcoming(String),

    #[error("invalid scheduled start time {value:?}: {reason}")]
    InvalidScheduledStart { value: String, reason: String },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Outcomes that mean "nothing to announce" rather than a failure.
    pub fn is_not_a_stream(&self) -> bool {
        matches!(
            self,
            SourceError::NotStream(_) | SourceError::NotLiveOrUpcoming(_)
        )
    }
}

/// One video returned by a broadcast search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
}

#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Videos of `channel_id` currently in the given broadcast state.
    async fn search(&self, channel_id: &str, event_type: EventType) -> Result<Vec<SearchHit>, SourceError>;

    /// Detail lookup of a single video.
    async fn video(&self, video_id: &str) -> Result<Video, SourceError>;
}

pub fn parse_scheduled_start(value: &str) -> Result<OffsetDateTime, SourceError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| SourceError::InvalidScheduledStart {
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

/// Scheduled start of an upcoming video, read from its streaming details.
pub fn scheduled_start_of(video: &Video) -> Result<OffsetDateTime, SourceError> {
    let value = video
        .live_streaming_details
        .as_ref()
        .and_then(|d| d.scheduled_start_time.as_deref())
        .ok_or_else(|| SourceError::InvalidScheduledStart {
            value: String::new(),
            reason: "missing scheduledStartTime".to_string(),
        })?;
    parse_scheduled_start(value)
}

/// Classify a detail lookup result. Used by the push path, where nothing is
/// known about the video besides its id.
pub fn classify_video(video: Video) -> Result<StreamCandidate, SourceError> {
    if video.live_streaming_details.is_none() {
        return Err(SourceError::NotStream(video.id));
    }
    let status = match video.broadcast_content() {
        LiveBroadcastContent::Live => StreamStatus::Live,
        LiveBroadcastContent::Upcoming => StreamStatus::Upcoming {
            scheduled_start: scheduled_start_of(&video)?,
        },
        LiveBroadcastContent::None => return Err(SourceError::NotLiveOrUpcoming(video.id)),
    };
    let snippet = video.snippet.unwrap_or_default();
    Ok(StreamCandidate {
        id: video.id,
        channel: ChannelHeader {
            id: snippet.channel_id,
            title: snippet.channel_title,
        },
        title: snippet.title,
        status,
    })
}

/// Look up `video_id` and classify it.
pub async fn resolve_stream(
    source: &dyn StreamSource,
    video_id: &str,
) -> Result<StreamCandidate, SourceError> {
    let video = source.video(video_id).await?;
    classify_video(video)
}
