pub mod pacing;
pub mod timezone;
