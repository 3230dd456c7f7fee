//! Wire types and HTTP clients for the external services streamwatch talks to.
//!
//! - [`objects`] holds the request/response shapes of the YouTube Data API,
//!   the WebSub hub, the pushed Atom feed and the Telegram Bot API.
//! - [`client`] (behind the `client` feature) holds thin `reqwest` clients
//!   for each of them.

#![forbid(unsafe_code)]

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
