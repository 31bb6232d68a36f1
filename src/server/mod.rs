//! HTTP surface
//!
//! Builds the axum router over a shared RecordingStore. The route shapes
//! mirror the recorder client's expectations under `/screenshare`.

pub mod recordings;

use crate::recording::RecordingStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Upper bound for a single uploaded chunk body
const MAX_CHUNK_BYTES: usize = 64 * 1024 * 1024;

/// Build the application router
pub fn router(store: Arc<RecordingStore>) -> Router {
    Router::new()
        .route("/screenshare/start_recording", post(recordings::start_recording))
        .route("/screenshare/upload_chunk", post(recordings::upload_chunk))
        .route("/screenshare/stop_recording", post(recordings::stop_recording))
        .route("/screenshare/recordings/:recording_id", get(recordings::get_recording))
        .route("/screenshare/video/:recording_id", get(recordings::serve_video))
        .route("/screenshare/download/:recording_id", get(recordings::download_recording))
        .route("/screenshare/list", get(recordings::list_recordings))
        .route("/screenshare/delete/:recording_id", post(recordings::delete_recording))
        .layer(DefaultBodyLimit::max(MAX_CHUNK_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
