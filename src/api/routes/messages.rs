//! Message routing handler.

use crate::api::AppState;
use crate::error::Error;
use crate::router::Response;
use axum::{Json, body::Bytes, extract::State};

/// POST /messages - Route an extension message
///
/// Always answers 200; success or failure is reported in the body so the
/// caller sees exactly the `{ success, error }` reply the router produces.
/// The body is parsed here rather than by the `Json` extractor so that
/// malformed JSON or a missing content type still yields a `Response`.
pub async fn handle_message(State(state): State<AppState>, body: Bytes) -> Json<Response> {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(message) => Json(state.downloader.handle_message(message).await),
        Err(e) => {
            tracing::warn!(error = %e, "Message body is not valid JSON");
            Json(Response::failure(&Error::Unrecognized))
        }
    }
}
