//! HTTP API handlers.
//!
//! - `websub`: the hub callback (`GET`/`POST /video`), mounted in push mode

pub mod websub;
