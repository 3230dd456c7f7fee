//! Atom feed documents pushed by the WebSub hub.
//!
//! A notification for a new or updated video looks like:
//!
//! ```xml
//! <feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
//!   <entry>
//!     <id>yt:video:VIDEO_ID</id>
//!     <yt:videoId>VIDEO_ID</yt:videoId>
//!     <yt:channelId>CHANNEL_ID</yt:channelId>
//!     <title>Video title</title>
//!   </entry>
//! </feed>
//! ```
//!
//! Deletion notices carry an `at:deleted-entry` element and no `entry`.

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("invalid feed document: {0}")]
    Xml(#[from] quick_xml::DeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub entry: Option<FeedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "videoId", alias = "yt:videoId", default)]
    pub video_id: String,
    #[serde(rename = "channelId", alias = "yt:channelId", default)]
    pub channel_id: String,
    #[serde(default)]
    pub title: String,
}

impl Feed {
    pub fn parse(body: &str) -> Result<Self, FeedError> {
        Ok(quick_xml::de::from_str(body)?)
    }

    /// The referenced video id, if the document carries a non-empty one.
    pub fn video_id(&self) -> Option<&str> {
        self.entry
            .as_ref()
            .map(|e| e.video_id.trim())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_notification() {
        let body = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <link rel="hub" href="https://pubsubhubbub.appspot.com"/>
  <title>YouTube video feed</title>
  <updated>2024-05-03T17:00:00.123456+00:00</updated>
  <entry>
    <id>yt:video:dQw4w9WgXcQ</id>
    <yt:videoId>dQw4w9WgXcQ</yt:videoId>
    <yt:channelId>UCuAXFkgsw1L7xaCfnd5JJOw</yt:channelId>
    <title>Friday stream</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=dQw4w9WgXcQ"/>
    <author>
      <name>Some Channel</name>
      <uri>https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw</uri>
    </author>
    <published>2024-05-03T17:00:00+00:00</published>
    <updated>2024-05-03T17:00:00.123456+00:00</updated>
  </entry>
</feed>"#;
        let feed = Feed::parse(body).unwrap();
        assert_eq!(feed.video_id(), Some("dQw4w9WgXcQ"));
        let entry = feed.entry.unwrap();
        assert_eq!(entry.channel_id, "UCuAXFkgsw1L7xaCfnd5JJOw");
        assert_eq!(entry.title, "Friday stream");
    }

    #[test]
    fn test_deleted_entry_has_no_video_id() {
        let body = r#"<feed xmlns:at="http://purl.org/atompub/tombstones/1.0" xmlns="http://www.w3.org/2005/Atom">
  <at:deleted-entry ref="yt:video:dQw4w9WgXcQ" when="2024-05-03T17:00:00+00:00"/>
</feed>"#;
        let feed = Feed::parse(body).unwrap();
        assert_eq!(feed.video_id(), None);
    }

    #[test]
    fn test_blank_video_id_is_ignored() {
        let body = "<feed><entry><videoId>  </videoId></entry></feed>";
        let feed = Feed::parse(body).unwrap();
        assert_eq!(feed.video_id(), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Feed::parse("this is not xml <<<").is_err());
    }
}
