//! YouTube Data API v3 client.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::youtube::{
    EventType, MAX_SEARCH_RESULTS, SearchListResponse, Video, VideoListResponse,
};

/// Typed client for the two Data API calls the notifier needs:
/// `search.list` and `videos.list`.
#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl YoutubeClient {
    pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

    /// Create a new `YoutubeClient` against the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(Self::DEFAULT_BASE_URL)?,
            api_key: api_key.into(),
        })
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Point the client at another API root. The URL must end with `/`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// `GET search?part=snippet&channelId=…&eventType=…&type=video`
    pub async fn search_broadcasts(
        &self,
        channel_id: &str,
        event_type: EventType,
    ) -> Result<SearchListResponse, ClientError> {
        let url = self.base_url.join("search")?;
        let max_results = MAX_SEARCH_RESULTS.to_string();
        let resp = self
            .http
            .get(url)
            .query(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("eventType", event_type.as_str()),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET videos?part=snippet,liveStreamingDetails&id=…`
    ///
    /// Fails with [`ClientError::UnexpectedItemCount`] unless exactly one
    /// video is returned.
    pub async fn video(&self, video_id: &str) -> Result<Video, ClientError> {
        let url = self.base_url.join("videos")?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("part", "snippet,liveStreamingDetails"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response: VideoListResponse = parse_response(resp).await?;
        let mut items = response.items;
        if items.len() != 1 {
            return Err(ClientError::UnexpectedItemCount(items.len()));
        }
        Ok(items.remove(0))
    }
}
