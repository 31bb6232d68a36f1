//! Recording session state
//!
//! Defines the session state machine and the metadata record persisted
//! alongside each recording.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting chunk uploads
    Recording,
    /// Finalization in progress
    Processing,
    /// Artifact assembled and durable
    Completed,
    /// Terminal failure
    Error,
}

/// Metadata record for a recording session
///
/// Serialized as `info.json` inside the session directory. Field names are
/// part of the on-disk format and the HTTP payloads, so they stay snake_case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Externally supplied session identifier, doubles as the recording id
    pub session_id: String,

    /// Optional correlation tag, stored but not interpreted
    #[serde(default)]
    pub game_id: Option<String>,

    /// Set at creation; absent only on records synthesized for bare artifacts
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Current lifecycle state
    pub status: SessionStatus,

    /// Number of chunks received so far
    #[serde(default)]
    pub chunks: u32,

    /// Set at finalization
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Seconds between start and finalization
    #[serde(default)]
    pub duration: Option<f64>,

    /// Path of the assembled artifact, set once it exists
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Failure description, present only in the error state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionInfo {
    /// Create the metadata record for a freshly started session
    pub fn new(session_id: impl Into<String>, game_id: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            game_id,
            start_time: Some(Utc::now()),
            status: SessionStatus::Recording,
            chunks: 0,
            end_time: None,
            duration: None,
            file_path: None,
            error: None,
        }
    }

    /// Minimal record for a bare artifact that has no session history
    pub fn bare_artifact(recording_id: impl Into<String>, path: &Path) -> Self {
        Self {
            session_id: recording_id.into(),
            game_id: None,
            start_time: None,
            status: SessionStatus::Completed,
            chunks: 0,
            end_time: None,
            duration: None,
            file_path: Some(path.to_path_buf()),
            error: None,
        }
    }

    /// True once the session has reached `completed` or `error`
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_recording_with_zero_chunks() {
        let info = SessionInfo::new("s1", Some("g1".to_string()));
        assert_eq!(info.status, SessionStatus::Recording);
        assert_eq!(info.chunks, 0);
        assert!(info.start_time.is_some());
        assert!(info.end_time.is_none());
        assert!(!info.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Recording).unwrap();
        assert_eq!(json, "\"recording\"");
        let back: SessionStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, SessionStatus::Completed);
    }

    #[test]
    fn error_field_omitted_unless_set() {
        let info = SessionInfo::new("s1", None);
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("\"error\""));
        // Nullable fields stay present in the record
        assert!(json.contains("\"end_time\":null"));
        assert!(json.contains("\"duration\":null"));
    }

    #[test]
    fn bare_artifact_record_is_completed() {
        let info = SessionInfo::bare_artifact("clip", Path::new("/tmp/clip.webm"));
        assert_eq!(info.status, SessionStatus::Completed);
        assert_eq!(info.session_id, "clip");
        assert!(info.file_path.is_some());
        assert!(info.start_time.is_none());
    }
}
