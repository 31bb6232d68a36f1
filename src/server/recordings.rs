//! Screen recording route handlers
//!
//! Thin handlers over the recording store. Response shapes are part of the
//! recorder client contract: store-level failures surface as
//! `success: false` with a message, not as error statuses.

use crate::recording::{RecordingStore, SessionInfo, StoreError};
use axum::body::Bytes;
use axum::extract::{Multipart, Path, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::services::ServeFile;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct StartResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct StopResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    recording_id: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    success: bool,
    recordings: Vec<SessionInfo>,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(StatusResponse {
            success: false,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Start a new recording session
pub async fn start_recording(
    State(store): State<Arc<RecordingStore>>,
    Json(request): Json<StartRequest>,
) -> Response {
    let Some(session_id) = request.session_id.filter(|id| !id.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Missing session_id");
    };

    match store.create_session(&session_id, request.game_id) {
        Ok(_) => Json(StartResponse {
            success: true,
            session_id: Some(session_id),
            message: "Recording session started".to_string(),
        })
        .into_response(),
        Err(e) => {
            let status = match e {
                StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
                StoreError::InvalidId(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            failure(status, e.to_string())
        }
    }
}

/// Upload one video chunk for a live session
///
/// Expects a multipart form with a `video_chunk` file part and a
/// `session_id` text part.
pub async fn upload_chunk(
    State(store): State<Arc<RecordingStore>>,
    mut multipart: Multipart,
) -> Response {
    let mut session_id: Option<String> = None;
    let mut chunk: Option<(String, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return failure(StatusCode::BAD_REQUEST, "Malformed multipart request"),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("session_id") => match field.text().await {
                Ok(text) => session_id = Some(text),
                Err(_) => return failure(StatusCode::BAD_REQUEST, "Malformed multipart request"),
            },
            Some("video_chunk") => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                match field.bytes().await {
                    Ok(data) => chunk = Some((file_name, data)),
                    Err(_) => {
                        return failure(StatusCode::BAD_REQUEST, "Malformed multipart request")
                    }
                }
            }
            _ => {}
        }
    }

    let Some((file_name, data)) = chunk else {
        return failure(StatusCode::BAD_REQUEST, "No video chunk in request");
    };
    let Some(session_id) = session_id.filter(|id| !id.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Missing session_id");
    };
    if file_name.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Empty filename");
    }

    let success = store.append_chunk(&session_id, &data);
    Json(StatusResponse {
        success,
        message: if success {
            "Chunk uploaded".to_string()
        } else {
            "Failed to process chunk".to_string()
        },
    })
    .into_response()
}

/// Stop a recording session and assemble its artifact
pub async fn stop_recording(
    State(store): State<Arc<RecordingStore>>,
    Json(request): Json<StopRequest>,
) -> Response {
    let Some(session_id) = request.session_id.filter(|id| !id.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Missing session_id");
    };

    match store.finalize_recording(&session_id) {
        Some(recording_id) => Json(StopResponse {
            success: true,
            recording_id: Some(recording_id),
            message: "Recording session stopped and processed".to_string(),
        })
        .into_response(),
        None => Json(StopResponse {
            success: false,
            recording_id: None,
            message: "Failed to finalize recording".to_string(),
        })
        .into_response(),
    }
}

/// Fetch recording metadata
pub async fn get_recording(
    State(store): State<Arc<RecordingStore>>,
    Path(recording_id): Path<String>,
) -> Response {
    match store.recording_info(&recording_id) {
        Some(info) => Json(info).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve a recording for inline playback
///
/// Range and conditional requests are supported so video elements can
/// seek; artifacts stream rather than being read into memory.
pub async fn serve_video(
    State(store): State<Arc<RecordingStore>>,
    Path(recording_id): Path<String>,
    request: Request,
) -> Response {
    let Some(path) = store.recording_file(&recording_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match ServeFile::new(&path).try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Failed to serve artifact {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve a recording as a file download
pub async fn download_recording(
    State(store): State<Arc<RecordingStore>>,
    Path(recording_id): Path<String>,
    request: Request,
) -> Response {
    let Some(path) = store.recording_file(&recording_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match ServeFile::new(&path).try_call(request).await {
        Ok(mut response) => {
            let disposition = format!("attachment; filename=\"gameplay_{recording_id}.webm\"");
            if let Ok(value) = HeaderValue::try_from(disposition) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, value);
            }
            response.into_response()
        }
        Err(e) => {
            tracing::error!("Failed to serve artifact {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// List all completed recordings
pub async fn list_recordings(State(store): State<Arc<RecordingStore>>) -> Response {
    Json(ListResponse {
        success: true,
        recordings: store.list_recordings(),
    })
    .into_response()
}

/// Delete a recording
pub async fn delete_recording(
    State(store): State<Arc<RecordingStore>>,
    Path(recording_id): Path<String>,
) -> Response {
    let success = store.delete_recording(&recording_id);
    Json(StatusResponse {
        success,
        message: if success {
            "Recording deleted".to_string()
        } else {
            "Failed to delete recording".to_string()
        },
    })
    .into_response()
}
