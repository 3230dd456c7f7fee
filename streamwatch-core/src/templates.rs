//! Announcement texts.

use streamwatch_sdk::objects::youtube::watch_url;

/// Hint appended to some upcoming announcements for chats that show raw UTC.
pub const TIMEZONE_TIP: &str =
    "Tip: set your chat's time zone to see start times in your local time.";

pub fn live_message(channel_title: &str, stream_title: &str, video_id: &str) -> String {
    let url = watch_url(video_id);
    if stream_title.is_empty() {
        format!("🔴 {channel_title} is live now!\n{url}")
    } else {
        format!("🔴 {channel_title} is live now!\n{stream_title}\n{url}")
    }
}

/// `scheduled_for` is already rendered for the recipient.
pub fn upcoming_message(
    channel_title: &str,
    stream_title: &str,
    scheduled_for: &str,
    video_id: &str,
    with_tip: bool,
) -> String {
    let url = watch_url(video_id);
    let mut message = if stream_title.is_empty() {
        format!("📅 {channel_title} scheduled a stream for {scheduled_for}\n{url}")
    } else {
        format!("📅 {channel_title} scheduled a stream for {scheduled_for}\n{stream_title}\n{url}")
    };
    if with_tip {
        message.push_str("\r\n");
        message.push_str(TIMEZONE_TIP);
    }
    message
}
