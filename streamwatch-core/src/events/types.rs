use crate::entities::StreamPhase;
use crate::entities::channels::Channel;
use time::OffsetDateTime;

/// A channel handed out by a watch-list feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedChannel {
    pub id: String,
    pub title: String,
}

impl From<Channel> for WatchedChannel {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            title: channel.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHeader {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Live,
    Upcoming { scheduled_start: OffsetDateTime },
}

/// A broadcast that may need announcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCandidate {
    /// Video id.
    pub id: String,
    pub channel: ChannelHeader,
    pub title: String,
    pub status: StreamStatus,
}

impl StreamCandidate {
    pub fn phase(&self) -> StreamPhase {
        match self.status {
            StreamStatus::Live => StreamPhase::Live,
            StreamStatus::Upcoming { .. } => StreamPhase::Upcoming,
        }
    }

    pub fn scheduled_start(&self) -> Option<OffsetDateTime> {
        match self.status {
            StreamStatus::Live => None,
            StreamStatus::Upcoming { scheduled_start } => Some(scheduled_start),
        }
    }
}
