pub mod feed;
pub mod telegram;
pub mod websub;
pub mod youtube;

pub use feed::{Feed, FeedEntry, FeedError};
pub use websub::{SubscribeRequest, VerificationError, VerificationQuery, VerifiedSubscription};
pub use youtube::{EventType, LiveBroadcastContent, SearchListResponse, Video, VideoListResponse};
