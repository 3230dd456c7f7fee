//! YouTube Data API v3 objects.
//!
//! Only the fields the notifier reads are modelled; everything else in the
//! responses is ignored.

use serde::Deserialize;

/// Largest page size accepted by `search.list`.
pub const MAX_SEARCH_RESULTS: u8 = 50;

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

/// `eventType` filter of `search.list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Live,
    Upcoming,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Live => "live",
            EventType::Upcoming => "upcoming",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `snippet.liveBroadcastContent` marker of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveBroadcastContent {
    Live,
    Upcoming,
    None,
}

impl LiveBroadcastContent {
    /// Unknown markers are reported as `None`, the API's "not a broadcast" value.
    pub fn parse(value: &str) -> Self {
        match value {
            "live" => LiveBroadcastContent::Live,
            "upcoming" => LiveBroadcastContent::Upcoming,
            _ => LiveBroadcastContent::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: SearchResultId,
    #[serde(default)]
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    #[serde(default)]
    pub kind: String,
    /// Only present when the result is a video.
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub live_broadcast_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    /// Absent for anything that never was a live broadcast.
    #[serde(default)]
    pub live_streaming_details: Option<LiveStreamingDetails>,
}

impl Video {
    /// The broadcast marker, `None` when the snippet part is missing.
    pub fn broadcast_content(&self) -> LiveBroadcastContent {
        self.snippet
            .as_ref()
            .and_then(|s| s.live_broadcast_content.as_deref())
            .map(LiveBroadcastContent::parse)
            .unwrap_or(LiveBroadcastContent::None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub live_broadcast_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamingDetails {
    /// RFC 3339 timestamp, usually with fractional seconds.
    #[serde(default)]
    pub scheduled_start_time: Option<String>,
    #[serde(default)]
    pub actual_start_time: Option<String>,
    #[serde(default)]
    pub actual_end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_with_live_details() {
        let json = r#"{
            "kind": "youtube#videoListResponse",
            "items": [{
                "kind": "youtube#video",
                "id": "dQw4w9WgXcQ",
                "snippet": {
                    "title": "Friday stream",
                    "channelId": "UCxxxxxxxxxxxxxxxxxxxxxA",
                    "channelTitle": "Some Channel",
                    "liveBroadcastContent": "upcoming"
                },
                "liveStreamingDetails": {
                    "scheduledStartTime": "2024-05-03T18:00:00.123Z"
                }
            }]
        }"#;
        let response: VideoListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        let video = &response.items[0];
        assert_eq!(video.broadcast_content(), LiveBroadcastContent::Upcoming);
        assert_eq!(
            video
                .live_streaming_details
                .as_ref()
                .and_then(|d| d.scheduled_start_time.as_deref()),
            Some("2024-05-03T18:00:00.123Z")
        );
    }

    #[test]
    fn test_plain_upload_has_no_live_details() {
        let json = r#"{"items": [{"id": "abc", "snippet": {"title": "vlog", "liveBroadcastContent": "none"}}]}"#;
        let response: VideoListResponse = serde_json::from_str(json).unwrap();
        let video = &response.items[0];
        assert!(video.live_streaming_details.is_none());
        assert_eq!(video.broadcast_content(), LiveBroadcastContent::None);
    }

    #[test]
    fn test_search_result_without_video_id() {
        let json = r#"{"items": [
            {"id": {"kind": "youtube#video", "videoId": "v1"}, "snippet": {"title": "live!"}},
            {"id": {"kind": "youtube#playlist"}}
        ]}"#;
        let response: SearchListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items[0].id.video_id.as_deref(), Some("v1"));
        assert_eq!(response.items[1].id.video_id, None);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc"), "https://youtube.com/watch?v=abc");
    }
}
