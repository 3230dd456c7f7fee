//! Rendering of scheduled start times in a chat's time zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::sync::RwLock;

/// RFC 850 style layout, e.g. `Friday, 03-May-24 20:00:00 CEST`.
const ZONED_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S %Z";

/// Caches zone lookups by name. Unknown names are cached too, so a bad
/// setting is only reported once.
#[derive(Debug, Default)]
pub struct TimezoneCache {
    zones: RwLock<HashMap<String, Option<Tz>>>,
}

impl TimezoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(&self, name: &str) -> Option<Tz> {
        if let Some(zone) = self.zones.read().await.get(name) {
            return *zone;
        }
        let zone = name.parse::<Tz>().ok();
        if zone.is_none() {
            tracing::warn!(time_zone = %name, "Unknown time zone, falling back to UTC");
        }
        self.zones.write().await.insert(name.to_owned(), zone);
        zone
    }

    /// Render `at` for a chat. Without a configured zone the UTC value is
    /// shown as is; an unknown zone renders in UTC.
    pub async fn render(&self, at: OffsetDateTime, time_zone: Option<&str>) -> String {
        let Some(name) = time_zone else {
            return format_utc(at);
        };
        let zone = self.resolve(name).await.unwrap_or(Tz::UTC);
        format_in_zone(at, zone).unwrap_or_else(|| format_utc(at))
    }
}

/// Plain UTC rendering, e.g. `2024-05-03 18:00:00 UTC`.
pub fn format_utc(at: OffsetDateTime) -> String {
    let layout = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    at.to_offset(time::UtcOffset::UTC)
        .format(layout)
        .unwrap_or_else(|_| at.to_string())
}

/// `None` only when the instant is outside chrono's representable range.
pub fn format_in_zone(at: OffsetDateTime, zone: Tz) -> Option<String> {
    let utc: DateTime<Utc> = DateTime::from_timestamp(at.unix_timestamp(), at.nanosecond())?;
    Some(utc.with_timezone(&zone).format(ZONED_FORMAT).to_string())
}
