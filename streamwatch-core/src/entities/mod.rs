pub mod channels;
pub mod chats;
pub mod done_streams;

/// Which notification a stream is in. A stream is announced at most once
/// per phase, and a live announcement also retires the upcoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamPhase {
    Upcoming,
    Live,
}

impl StreamPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamPhase::Upcoming => "upcoming",
            StreamPhase::Live => "live",
        }
    }
}

impl std::fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
