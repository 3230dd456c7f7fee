//! WebSub callback handlers.
//!
//! # Endpoints
//!
//! - `GET /video`  – hub verification of a subscribe request; records the
//!   granted lease and echoes `hub.challenge`
//! - `POST /video` – Atom feed push; the referenced video is looked up and,
//!   if it is a live or upcoming stream, queued for notification

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use streamwatch_core::sources::resolve_stream;
use streamwatch_sdk::objects::websub::CALLBACK_PATH;
use streamwatch_sdk::objects::{Feed, VerificationQuery};

use crate::state::AppState;

/// Build the WebSub callback router.
pub fn router() -> Router<AppState> {
    Router::new().route(CALLBACK_PATH, get(verify_subscription).post(receive_feed))
}

/// `GET /video`
///
/// Any validation failure, and a channel that is not on the watch list,
/// answers 404 so the hub drops the subscription.
async fn verify_subscription(
    State(state): State<AppState>,
    Query(query): Query<VerificationQuery>,
) -> Result<String, WebSubError> {
    let verified = query.validate().map_err(|e| {
        tracing::debug!(error = %e, "Rejected hub verification");
        WebSubError::NotFound
    })?;

    let stored = state
        .store
        .store_lease(&verified.channel_id, verified.lease_seconds)
        .await
        .map_err(|e| {
            tracing::error!(channel_id = %verified.channel_id, error = %e, "Failed to store lease");
            WebSubError::NotFound
        })?;
    if !stored {
        tracing::debug!(channel_id = %verified.channel_id, "Verification for unknown channel");
        return Err(WebSubError::NotFound);
    }

    tracing::info!(
        channel_id = %verified.channel_id,
        lease_seconds = verified.lease_seconds,
        "Hub subscription verified"
    );
    Ok(verified.challenge)
}

/// `POST /video`
async fn receive_feed(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, WebSubError> {
    let document = std::str::from_utf8(&body).map_err(|e| {
        tracing::warn!(error = %e, "Feed push is not UTF-8");
        WebSubError::Malformed
    })?;
    let feed = Feed::parse(document).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse feed push");
        WebSubError::Malformed
    })?;
    let Some(video_id) = feed.video_id() else {
        tracing::debug!("Feed push without a video id");
        return Ok(StatusCode::NO_CONTENT);
    };

    let stream = match resolve_stream(state.source.as_ref(), video_id).await {
        Ok(stream) => stream,
        Err(e) if e.is_not_a_stream() => {
            tracing::debug!(video_id = %video_id, reason = %e, "Pushed video is not an announceable stream");
            return Ok(StatusCode::NO_CONTENT);
        }
        Err(e) => {
            tracing::error!(video_id = %video_id, error = %e, "Failed to look up pushed video");
            return Err(WebSubError::Lookup);
        }
    };

    tracing::debug!(video_id = %video_id, phase = %stream.phase(), "Queued pushed stream");
    state
        .stream_tx
        .send(stream)
        .await
        .map_err(|_| WebSubError::ShuttingDown)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug)]
enum WebSubError {
    NotFound,
    Malformed,
    Lookup,
    ShuttingDown,
}

impl IntoResponse for WebSubError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebSubError::NotFound => StatusCode::NOT_FOUND.into_response(),
            WebSubError::Malformed => (StatusCode::BAD_REQUEST, "malformed feed").into_response(),
            WebSubError::Lookup => {
                (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed").into_response()
            }
            WebSubError::ShuttingDown => {
                (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
            }
        }
    }
}
