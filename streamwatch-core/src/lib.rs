#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![forbid(unsafe_code)]

pub mod config;
pub mod coordination;
pub mod entities;
pub mod events;
pub mod framework;
pub mod messaging;
pub mod processors;
pub mod sources;
pub mod store;
pub mod templates;
pub mod tracker;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
