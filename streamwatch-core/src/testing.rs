//! In-memory collaborators shared by the unit tests.

use crate::coordination::{LockError, LockLease, LockService};
use crate::entities::StreamPhase;
use crate::entities::channels::Channel;
use crate::entities::chats::Chat;
use crate::events::{ChannelHeader, StreamCandidate, StreamStatus};
use crate::framework::StoreError;
use crate::messaging::{DeliveryError, Messenger};
use crate::sources::{SearchHit, SourceError, StreamSource};
use crate::store::{CompletionStore, SubscriptionStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use streamwatch_sdk::objects::youtube::{LiveStreamingDetails, VideoSnippet};
use streamwatch_sdk::objects::{EventType, Video};
use time::OffsetDateTime;
use time::macros::datetime;

pub const SCHEDULED_START: OffsetDateTime = datetime!(2024-05-03 18:00:00 UTC);

pub fn live_candidate(id: &str, channel_id: &str) -> StreamCandidate {
    StreamCandidate {
        id: id.to_string(),
        channel: ChannelHeader {
            id: channel_id.to_string(),
            title: format!("{channel_id} title"),
        },
        title: format!("{id} stream"),
        status: StreamStatus::Live,
    }
}

pub fn upcoming_candidate(id: &str, channel_id: &str) -> StreamCandidate {
    StreamCandidate {
        status: StreamStatus::Upcoming {
            scheduled_start: SCHEDULED_START,
        },
        ..live_candidate(id, channel_id)
    }
}

/// A detail lookup result. Streaming details are present whenever a
/// broadcast marker is given.
pub fn video(id: &str, channel_id: &str, marker: Option<&str>, scheduled: Option<&str>) -> Video {
    Video {
        id: id.to_string(),
        snippet: Some(VideoSnippet {
            title: format!("{id} stream"),
            channel_id: channel_id.to_string(),
            channel_title: format!("{channel_id} title"),
            live_broadcast_content: Some(marker.unwrap_or("none").to_string()),
        }),
        live_streaming_details: marker.map(|_| LiveStreamingDetails {
            scheduled_start_time: scheduled.map(str::to_string),
            actual_start_time: None,
            actual_end_time: None,
        }),
    }
}

pub fn chat(id: i64, time_zone: Option<&str>) -> Chat {
    Chat {
        id,
        time_zone: time_zone.map(str::to_string),
        enabled: true,
    }
}

pub fn channel(id: &str, lease_seconds: Option<i32>, last_update: OffsetDateTime) -> Channel {
    Channel {
        id: id.to_string(),
        title: format!("{id} title"),
        lease_seconds,
        last_update,
    }
}

#[derive(Default)]
struct StoreState {
    channels: Vec<Channel>,
    subscriptions: Vec<(String, Chat)>,
    done: HashMap<String, (bool, bool)>,
    marks: Vec<(String, StreamPhase)>,
    fail_completion_reads: bool,
    fail_completion_writes: bool,
    fail_chat_reads: bool,
    fail_channel_reads: bool,
}

/// Store fake with the same merge rule as the `done_streams` upsert.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    channel_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn add_channel(&self, channel: Channel) {
        self.state.lock().unwrap().channels.push(channel);
    }

    pub fn subscribe(&self, channel_id: &str, chat: Chat) {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .push((channel_id.to_string(), chat));
    }

    pub fn done_flags(&self, stream_id: &str) -> Option<(bool, bool)> {
        self.state.lock().unwrap().done.get(stream_id).copied()
    }

    pub fn marks(&self) -> Vec<(String, StreamPhase)> {
        self.state.lock().unwrap().marks.clone()
    }

    pub fn channel_queries(&self) -> usize {
        self.channel_queries.load(Ordering::SeqCst)
    }

    pub fn fail_completion_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_completion_reads = fail;
    }

    pub fn fail_completion_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_completion_writes = fail;
    }

    pub fn fail_chat_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_chat_reads = fail;
    }

    pub fn fail_channel_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_channel_reads = fail;
    }

    fn subscribed(state: &StoreState) -> Vec<Channel> {
        state
            .channels
            .iter()
            .filter(|c| state.subscriptions.iter().any(|(id, _)| *id == c.id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscribed_chats(&self, channel_id: &str) -> Result<Vec<Chat>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_chat_reads {
            return Err(StoreError::Unavailable("chats".to_string()));
        }
        Ok(state
            .subscriptions
            .iter()
            .filter(|(id, chat)| id == channel_id && chat.enabled)
            .map(|(_, chat)| chat.clone())
            .collect())
    }

    async fn active_channels(&self) -> Result<Vec<Channel>, StoreError> {
        self.channel_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_channel_reads {
            return Err(StoreError::Unavailable("channels".to_string()));
        }
        Ok(Self::subscribed(&state))
    }

    async fn lease_expiring_channels(&self, margin: Duration) -> Result<Vec<Channel>, StoreError> {
        self.channel_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_channel_reads {
            return Err(StoreError::Unavailable("channels".to_string()));
        }
        let horizon = OffsetDateTime::now_utc() + margin;
        Ok(Self::subscribed(&state)
            .into_iter()
            .filter(|c| match c.lease_seconds {
                None => true,
                Some(lease) => c.last_update + time::Duration::seconds(lease.into()) < horizon,
            })
            .collect())
    }

    async fn store_lease(&self, channel_id: &str, lease_seconds: i32) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        match state.channels.iter_mut().find(|c| c.id == channel_id) {
            Some(channel) => {
                channel.lease_seconds = Some(lease_seconds);
                channel.last_update = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    async fn is_phase_done(&self, stream_id: &str, phase: StreamPhase) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_completion_reads {
            return Err(StoreError::Unavailable("done_streams".to_string()));
        }
        let (upcoming, live) = state.done.get(stream_id).copied().unwrap_or_default();
        Ok(match phase {
            StreamPhase::Upcoming => upcoming,
            StreamPhase::Live => live,
        })
    }

    async fn mark_done(&self, stream_id: &str, phase: StreamPhase) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_completion_writes {
            return Err(StoreError::Unavailable("done_streams".to_string()));
        }
        state.marks.push((stream_id.to_string(), phase));
        let entry = state.done.entry(stream_id.to_string()).or_default();
        entry.0 = true;
        entry.1 = entry.1 || phase == StreamPhase::Live;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLocks {
    held: Mutex<HashMap<String, (String, tokio::time::Instant)>>,
    attempts: Mutex<HashMap<String, usize>>,
    releases: Mutex<Vec<String>>,
    next_token: AtomicUsize,
    unavailable: Mutex<bool>,
}

impl MemoryLocks {
    pub fn attempts(&self, key: &str) -> usize {
        self.attempts.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn is_held(&self, key: &str) -> bool {
        let now = tokio::time::Instant::now();
        self.held
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|(_, expires)| *expires > now)
    }

    pub fn releases(&self) -> Vec<String> {
        self.releases.lock().unwrap().clone()
    }

    /// Simulate another instance holding `key` for `ttl`.
    pub fn hold(&self, key: &str, ttl: Duration) {
        self.held.lock().unwrap().insert(
            key.to_string(),
            ("foreign".to_string(), tokio::time::Instant::now() + ttl),
        );
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl LockService for MemoryLocks {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockLease>, LockError> {
        *self.attempts.lock().unwrap().entry(key.to_string()).or_default() += 1;
        if *self.unavailable.lock().unwrap() {
            return Err(LockError::Unavailable("memory locks".to_string()));
        }
        let now = tokio::time::Instant::now();
        let mut held = self.held.lock().unwrap();
        if held.get(key).is_some_and(|(_, expires)| *expires > now) {
            return Ok(None);
        }
        let token = format!("token-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        held.insert(key.to_string(), (token.clone(), now + ttl));
        Ok(Some(LockLease {
            key: key.to_string(),
            token,
        }))
    }

    async fn release(&self, lease: &LockLease) -> Result<bool, LockError> {
        self.releases.lock().unwrap().push(lease.key.clone());
        let now = tokio::time::Instant::now();
        let mut held = self.held.lock().unwrap();
        match held.get(&lease.key) {
            Some((token, expires)) if *token == lease.token && *expires > now => {
                held.remove(&lease.key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(i64, String)>>,
    failing: Mutex<HashSet<i64>>,
}

impl RecordingMessenger {
    pub fn fail_for(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<i64> {
        self.sent().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::Rejected("chat not found".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSource {
    searches: Mutex<HashMap<(String, EventType), Vec<SearchHit>>>,
    failing_searches: Mutex<HashSet<(String, EventType)>>,
    videos: Mutex<HashMap<String, Video>>,
    lookups: AtomicUsize,
}

impl FakeSource {
    pub fn with_search(&self, channel_id: &str, event_type: EventType, video_ids: &[&str]) {
        let hits = video_ids
            .iter()
            .map(|id| SearchHit {
                video_id: id.to_string(),
                title: format!("{id} stream"),
            })
            .collect();
        self.searches
            .lock()
            .unwrap()
            .insert((channel_id.to_string(), event_type), hits);
    }

    pub fn fail_search(&self, channel_id: &str, event_type: EventType) {
        self.failing_searches
            .lock()
            .unwrap()
            .insert((channel_id.to_string(), event_type));
    }

    pub fn with_video(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id.clone(), video);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamSource for FakeSource {
    async fn search(&self, channel_id: &str, event_type: EventType) -> Result<Vec<SearchHit>, SourceError> {
        let key = (channel_id.to_string(), event_type);
        if self.failing_searches.lock().unwrap().contains(&key) {
            return Err(SourceError::Unavailable("search".to_string()));
        }
        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn video(&self, video_id: &str) -> Result<Video, SourceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.videos
            .lock()
            .unwrap()
            .get(video_id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable(format!("no video {video_id}")))
    }
}
