use super::{SearchHit, SourceError, StreamSource};
use async_trait::async_trait;
use std::time::Duration;
use streamwatch_sdk::client::YoutubeClient;
use streamwatch_sdk::objects::{EventType, Video};

/// [`StreamSource`] backed by the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YoutubeSource {
    client: YoutubeClient,
    timeout: Duration,
}

impl YoutubeSource {
    pub fn new(client: YoutubeClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl StreamSource for YoutubeSource {
    async fn search(&self, channel_id: &str, event_type: EventType) -> Result<Vec<SearchHit>, SourceError> {
        let response = tokio::time::timeout(
            self.timeout,
            self.client.search_broadcasts(channel_id, event_type),
        )
        .await
        .map_err(|_| SourceError::Timeout(self.timeout))??;

        let hits = response
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                let title = item.snippet.map(|s| s.title).unwrap_or_default();
                Some(SearchHit { video_id, title })
            })
            .collect();
        Ok(hits)
    }

    async fn video(&self, video_id: &str) -> Result<Video, SourceError> {
        let video = tokio::time::timeout(self.timeout, self.client.video(video_id))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))??;
        Ok(video)
    }
}
