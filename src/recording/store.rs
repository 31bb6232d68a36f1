//! Recording store
//!
//! Owns the on-disk recording tree and the in-memory table of live
//! sessions. Chunks are appended per session, assembled into a single
//! artifact at finalization, and the resulting recordings can be queried,
//! listed, and deleted. All failures are logged and surfaced through the
//! boolean/Option contract of each operation.

use super::state::{SessionInfo, SessionStatus};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

const INFO_FILE: &str = "info.json";
const CHUNKS_DIR: &str = "chunks";

/// Store-level errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("invalid session id: {0:?}")]
    InvalidId(String),

    #[error("session already exists: {0}")]
    AlreadyExists(String),

    #[error("expected chunk file not found: {}", .0.display())]
    MissingChunk(PathBuf),

    #[error("no chunks received")]
    NoChunks,
}

/// A live session together with its reaper bookkeeping
struct ActiveSession {
    info: SessionInfo,
    last_activity: Instant,
}

/// Owns recording-session state, chunk persistence, and finalization
///
/// Sessions are independent: the table lock is only held to look up,
/// register, or evict entries. Each live session carries its own mutex,
/// which serializes chunk writes, finalization, and metadata persistence
/// for that session while other sessions proceed in parallel.
pub struct RecordingStore {
    root: PathBuf,
    active: RwLock<HashMap<String, Arc<Mutex<ActiveSession>>>>,
}

impl RecordingStore {
    /// Open a store rooted at `root`, creating the directory if needed
    ///
    /// Sessions left mid-flight by a previous process are marked failed:
    /// their in-memory counters are gone, so they can never finalize.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let store = Self {
            root,
            active: RwLock::new(HashMap::new()),
        };
        store.recover_interrupted();
        Ok(store)
    }

    /// Start a new recording session
    ///
    /// Rejects ids already live in the active table or present on disk, so a
    /// session is never silently overwritten.
    pub fn create_session(
        &self,
        session_id: &str,
        game_id: Option<String>,
    ) -> Result<SessionInfo, StoreError> {
        if !is_valid_id(session_id) {
            return Err(StoreError::InvalidId(session_id.to_string()));
        }

        let session_dir = self.session_dir(session_id);
        let info = SessionInfo::new(session_id, game_id);
        let entry = Arc::new(Mutex::new(ActiveSession {
            info: info.clone(),
            last_activity: Instant::now(),
        }));
        // Appends for this id queue on the session mutex until the
        // directory exists
        let session = entry.lock();

        // Reserve the id atomically; disk work happens with the table
        // lock released
        {
            let mut active = self.active.write();
            if active.contains_key(session_id) || session_dir.exists() {
                return Err(StoreError::AlreadyExists(session_id.to_string()));
            }
            active.insert(session_id.to_string(), entry.clone());
        }

        if let Err(e) = self.prepare_session_dir(&session_dir, &session.info) {
            drop(session);
            self.active.write().remove(session_id);
            return Err(e);
        }
        drop(session);

        tracing::info!(
            "Started recording session {} (game: {:?})",
            session_id,
            info.game_id
        );
        Ok(info)
    }

    fn prepare_session_dir(
        &self,
        session_dir: &Path,
        info: &SessionInfo,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(session_dir.join(CHUNKS_DIR))?;
        self.write_info(session_dir, info)
    }

    /// Append a chunk to a live session
    ///
    /// Returns false for unknown or already-finalized sessions and on write
    /// failure. The chunk file is synced to disk before success is reported;
    /// the metadata file is not rewritten until finalization.
    pub fn append_chunk(&self, session_id: &str, data: &[u8]) -> bool {
        let entry = { self.active.read().get(session_id).cloned() };
        let Some(entry) = entry else {
            tracing::warn!("Dropping chunk for unknown session: {}", session_id);
            return false;
        };

        let mut session = entry.lock();
        if session.info.status != SessionStatus::Recording {
            tracing::warn!(
                "Dropping chunk for session {} in state {:?}",
                session_id,
                session.info.status
            );
            return false;
        }

        let sequence = session.info.chunks;
        let chunk_path = self
            .session_dir(session_id)
            .join(CHUNKS_DIR)
            .join(chunk_file_name(sequence));

        match write_durable(&chunk_path, data) {
            Ok(()) => {
                session.info.chunks = sequence + 1;
                session.last_activity = Instant::now();
                tracing::debug!(
                    "Saved chunk {} ({} bytes) for session {}",
                    sequence,
                    data.len(),
                    session_id
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to save chunk {} for session {}: {}", sequence, session_id, e);
                false
            }
        }
    }

    /// Finalize a session, assembling its chunks into the final artifact
    ///
    /// Returns the recording id on success. On any failure, including a
    /// session that received no chunks, the session is marked failed and
    /// evicted; the persisted record is the remaining source of truth.
    pub fn finalize_recording(&self, session_id: &str) -> Option<String> {
        let entry = { self.active.read().get(session_id).cloned() };
        let Some(entry) = entry else {
            tracing::warn!("Finalize requested for unknown session: {}", session_id);
            return None;
        };

        let mut session = entry.lock();
        if session.info.status != SessionStatus::Recording {
            tracing::warn!(
                "Finalize requested for session {} already in state {:?}",
                session_id,
                session.info.status
            );
            return None;
        }

        let outcome = self.run_finalize(&mut session.info);
        self.active.write().remove(session_id);

        match outcome {
            Ok(()) => {
                tracing::info!(
                    "Finalized recording {} ({} chunks, {:.1}s)",
                    session_id,
                    session.info.chunks,
                    session.info.duration.unwrap_or(0.0)
                );
                Some(session_id.to_string())
            }
            Err(e) => {
                tracing::error!("Failed to finalize recording {}: {}", session_id, e);
                None
            }
        }
    }

    /// Look up a recording by id
    ///
    /// Resolves a session directory with parseable metadata first, then a
    /// bare `<id>.webm` artifact at the store root.
    pub fn recording_info(&self, recording_id: &str) -> Option<SessionInfo> {
        if !is_valid_id(recording_id) {
            return None;
        }

        let session_dir = self.session_dir(recording_id);
        if session_dir.is_dir() && session_dir.join(INFO_FILE).is_file() {
            match self.read_info(&session_dir) {
                Ok(info) => return Some(info),
                Err(e) => {
                    tracing::warn!("Unreadable metadata for recording {}: {}", recording_id, e);
                }
            }
        }

        let bare = self.bare_artifact_path(recording_id);
        if bare.is_file() {
            return Some(SessionInfo::bare_artifact(recording_id, &bare));
        }

        None
    }

    /// Resolve the artifact file for a recording
    ///
    /// Never returns a path that does not exist on disk.
    pub fn recording_file(&self, recording_id: &str) -> Option<PathBuf> {
        if let Some(info) = self.recording_info(recording_id) {
            if let Some(path) = info.file_path {
                if path.is_file() {
                    return Some(path);
                }
            }
        }

        let bare = self.bare_artifact_path(recording_id);
        if bare.is_file() {
            return Some(bare);
        }

        None
    }

    /// List all completed recordings, ordered by start time
    ///
    /// Sessions still recording, stuck, or failed are excluded, as are bare
    /// artifacts without metadata. Unreadable metadata is skipped.
    pub fn list_recordings(&self) -> Vec<SessionInfo> {
        let mut recordings = Vec::new();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to scan recordings directory: {}", e);
                return recordings;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || !path.join(INFO_FILE).is_file() {
                continue;
            }
            match self.read_info(&path) {
                Ok(info) if info.status == SessionStatus::Completed => recordings.push(info),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Skipping recording with invalid metadata at {}: {}", path.display(), e);
                }
            }
        }

        recordings.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        recordings
    }

    /// Delete a recording, removing its directory tree and any bare artifact
    ///
    /// A live session with the same id is torn down as well. Returns false
    /// when nothing matched or removal failed.
    pub fn delete_recording(&self, recording_id: &str) -> bool {
        if self.recording_info(recording_id).is_none() {
            return false;
        }

        self.active.write().remove(recording_id);

        let session_dir = self.session_dir(recording_id);
        if session_dir.is_dir() {
            if let Err(e) = fs::remove_dir_all(&session_dir) {
                tracing::error!("Failed to delete recording {}: {}", recording_id, e);
                return false;
            }
        }

        let bare = self.bare_artifact_path(recording_id);
        if bare.is_file() {
            if let Err(e) = fs::remove_file(&bare) {
                tracing::error!("Failed to delete artifact {}: {}", bare.display(), e);
                return false;
            }
        }

        tracing::info!("Deleted recording {}", recording_id);
        true
    }

    /// Fail and evict live sessions idle for longer than `max_idle`
    ///
    /// Returns the number of sessions reaped.
    pub fn sweep_stale(&self, max_idle: Duration) -> usize {
        let snapshot: Vec<(String, Arc<Mutex<ActiveSession>>)> = {
            self.active
                .read()
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect()
        };

        let mut reaped = Vec::new();
        for (session_id, entry) in snapshot {
            let mut session = entry.lock();
            if session.info.status != SessionStatus::Recording
                || session.last_activity.elapsed() < max_idle
            {
                continue;
            }

            tracing::warn!(
                "Reaping session {} after {:?} without activity",
                session_id,
                session.last_activity.elapsed()
            );
            session.info.status = SessionStatus::Error;
            session.info.error = Some("session timed out without finalization".to_string());
            if let Err(e) = self.write_info(&self.session_dir(&session_id), &session.info) {
                tracing::error!("Failed to persist timeout for session {}: {}", session_id, e);
            }
            reaped.push(session_id);
        }

        if !reaped.is_empty() {
            let mut active = self.active.write();
            for session_id in &reaped {
                active.remove(session_id);
            }
        }
        reaped.len()
    }

    /// Finalization steps; on failure the session record is marked failed
    fn run_finalize(&self, info: &mut SessionInfo) -> Result<(), StoreError> {
        let session_dir = self.session_dir(&info.session_id);

        let end_time = Utc::now();
        info.end_time = Some(end_time);
        info.duration = info
            .start_time
            .map(|start| (end_time - start).num_milliseconds() as f64 / 1000.0);
        info.status = SessionStatus::Processing;

        match self.try_assemble(&session_dir, info) {
            Ok(()) => Ok(()),
            Err(e) => {
                info.status = SessionStatus::Error;
                info.error = Some(e.to_string());
                if let Err(persist) = self.write_info(&session_dir, info) {
                    tracing::error!(
                        "Failed to persist error state for session {}: {}",
                        info.session_id,
                        persist
                    );
                }
                Err(e)
            }
        }
    }

    fn try_assemble(&self, session_dir: &Path, info: &mut SessionInfo) -> Result<(), StoreError> {
        self.write_info(session_dir, info)?;

        if info.chunks == 0 {
            return Err(StoreError::NoChunks);
        }

        let chunks_dir = session_dir.join(CHUNKS_DIR);
        let output = session_dir.join(artifact_file_name(&info.session_id));

        if info.chunks == 1 {
            let chunk = chunks_dir.join(chunk_file_name(0));
            if !chunk.is_file() {
                return Err(StoreError::MissingChunk(chunk));
            }
            fs::copy(&chunk, &output)?;
            tracing::debug!("Copied single chunk to {}", output.display());
        } else if let Err(e) = concatenate_chunks(&chunks_dir, info.chunks, &output) {
            // Do not leave a partial artifact behind
            let _ = fs::remove_file(&output);
            return Err(e);
        } else {
            tracing::debug!("Merged {} chunks into {}", info.chunks, output.display());
        }

        info.file_path = Some(output);
        info.status = SessionStatus::Completed;
        self.write_info(session_dir, info)?;
        Ok(())
    }

    /// Mark sessions stranded by a previous process as failed
    fn recover_interrupted(&self) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to scan recordings directory: {}", e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || !path.join(INFO_FILE).is_file() {
                continue;
            }
            match self.read_info(&path) {
                Ok(mut info) if !info.is_terminal() => {
                    tracing::warn!(
                        "Marking session {} interrupted by restart as failed",
                        info.session_id
                    );
                    info.status = SessionStatus::Error;
                    info.error = Some("interrupted before finalization".to_string());
                    if let Err(e) = self.write_info(&path, &info) {
                        tracing::error!("Failed to update stranded session at {}: {}", path.display(), e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable metadata at {}: {}", path.display(), e);
                }
            }
        }
    }

    fn write_info(&self, session_dir: &Path, info: &SessionInfo) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(info)?;
        fs::write(session_dir.join(INFO_FILE), content)?;
        Ok(())
    }

    fn read_info(&self, session_dir: &Path) -> Result<SessionInfo, StoreError> {
        let content = fs::read_to_string(session_dir.join(INFO_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    fn bare_artifact_path(&self, recording_id: &str) -> PathBuf {
        self.root.join(format!("{recording_id}.webm"))
    }
}

/// Session ids become directory names; keep them to a safe character set
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn chunk_file_name(sequence: u32) -> String {
    format!("chunk_{sequence:05}.webm")
}

fn artifact_file_name(session_id: &str) -> String {
    format!("gameplay_{session_id}.webm")
}

/// Write and sync a chunk so it survives a crash once reported saved
fn write_durable(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Raw byte concatenation in strict sequence order; a missing chunk fails
/// the assembly rather than being skipped
fn concatenate_chunks(chunks_dir: &Path, count: u32, output: &Path) -> Result<(), StoreError> {
    let mut out = fs::File::create(output)?;
    for sequence in 0..count {
        let chunk = chunks_dir.join(chunk_file_name(sequence));
        let mut input = fs::File::open(&chunk).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::MissingChunk(chunk.clone())
            } else {
                StoreError::Io(e)
            }
        })?;
        io::copy(&mut input, &mut out)?;
    }
    out.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_store() -> (tempfile::TempDir, RecordingStore) {
        let dir = tempdir().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn create_session_initializes_directories_and_metadata() {
        let (dir, store) = new_store();
        let info = store.create_session("s1", Some("g1".to_string())).unwrap();

        assert_eq!(info.status, SessionStatus::Recording);
        assert_eq!(info.chunks, 0);
        assert!(dir.path().join("s1/chunks").is_dir());

        let raw = fs::read_to_string(dir.path().join("s1/info.json")).unwrap();
        let parsed: SessionInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.session_id, "s1");
        assert_eq!(parsed.game_id.as_deref(), Some("g1"));
        assert_eq!(parsed.status, SessionStatus::Recording);
    }

    #[test]
    fn create_session_rejects_duplicate_ids() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        assert!(matches!(
            store.create_session("s1", None),
            Err(StoreError::AlreadyExists(_))
        ));

        // A directory left on disk blocks the id even without a live entry
        fs::create_dir_all(dir.path().join("old")).unwrap();
        assert!(matches!(
            store.create_session("old", None),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_session_rejects_unsafe_ids() {
        let (_dir, store) = new_store();
        for id in ["", "..", "../evil", "a/b", ".hidden"] {
            assert!(
                matches!(store.create_session(id, None), Err(StoreError::InvalidId(_))),
                "id {id:?} should be rejected"
            );
        }
    }

    #[test]
    fn append_assigns_sequential_numbers() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();

        assert!(store.append_chunk("s1", b"one"));
        assert!(store.append_chunk("s1", b"two"));
        assert!(store.append_chunk("s1", b"three"));

        let chunks = dir.path().join("s1/chunks");
        assert_eq!(fs::read(chunks.join("chunk_00000.webm")).unwrap(), b"one");
        assert_eq!(fs::read(chunks.join("chunk_00001.webm")).unwrap(), b"two");
        assert_eq!(fs::read(chunks.join("chunk_00002.webm")).unwrap(), b"three");
    }

    #[test]
    fn append_to_unknown_session_is_dropped() {
        let (_dir, store) = new_store();
        assert!(!store.append_chunk("nope", b"data"));
    }

    #[test]
    fn single_chunk_finalize_copies_verbatim() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"only chunk");

        assert_eq!(store.finalize_recording("s1").as_deref(), Some("s1"));

        let artifact = dir.path().join("s1/gameplay_s1.webm");
        assert_eq!(fs::read(&artifact).unwrap(), b"only chunk");

        let info = store.recording_info("s1").unwrap();
        assert_eq!(info.status, SessionStatus::Completed);
        assert_eq!(info.chunks, 1);
        assert_eq!(info.file_path.as_deref(), Some(artifact.as_path()));
        assert!(info.duration.is_some());
    }

    #[test]
    fn multi_chunk_finalize_concatenates_in_order() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", &[b'a'; 10]);
        store.append_chunk("s1", &[b'b'; 20]);
        store.append_chunk("s1", &[b'c'; 30]);

        assert_eq!(store.finalize_recording("s1").as_deref(), Some("s1"));

        let data = fs::read(dir.path().join("s1/gameplay_s1.webm")).unwrap();
        assert_eq!(data.len(), 60);
        assert_eq!(&data[..10], &[b'a'; 10]);
        assert_eq!(&data[10..30], &[b'b'; 20]);
        assert_eq!(&data[30..], &[b'c'; 30]);

        let recordings = store.list_recordings();
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].session_id, "s1");
    }

    #[test]
    fn zero_chunk_finalize_fails_and_marks_error() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();

        assert_eq!(store.finalize_recording("s1"), None);
        assert!(!dir.path().join("s1/gameplay_s1.webm").exists());

        let info = store.recording_info("s1").unwrap();
        assert_eq!(info.status, SessionStatus::Error);
        assert!(info.error.is_some());

        // The session was evicted, so later chunks are dropped
        assert!(!store.append_chunk("s1", b"late"));
    }

    #[test]
    fn finalize_unknown_session_returns_none() {
        let (_dir, store) = new_store();
        assert_eq!(store.finalize_recording("nope"), None);
    }

    #[test]
    fn missing_chunk_fails_finalize() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"first");
        store.append_chunk("s1", b"second");

        fs::remove_file(dir.path().join("s1/chunks/chunk_00001.webm")).unwrap();

        assert_eq!(store.finalize_recording("s1"), None);
        assert!(!dir.path().join("s1/gameplay_s1.webm").exists());

        let info = store.recording_info("s1").unwrap();
        assert_eq!(info.status, SessionStatus::Error);
    }

    #[test]
    fn append_after_finalize_is_dropped() {
        let (_dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"data");
        store.finalize_recording("s1").unwrap();

        assert!(!store.append_chunk("s1", b"late"));
    }

    #[test]
    fn recording_file_resolves_completed_artifact() {
        let (_dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"data");
        store.finalize_recording("s1").unwrap();

        let path = store.recording_file("s1").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn recording_file_never_returns_missing_path() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"data");
        store.finalize_recording("s1").unwrap();

        // Metadata still points at the artifact, but the file is gone
        fs::remove_file(dir.path().join("s1/gameplay_s1.webm")).unwrap();
        assert_eq!(store.recording_file("s1"), None);
    }

    #[test]
    fn bare_artifact_is_resolvable_but_unlisted() {
        let (dir, store) = new_store();
        fs::write(dir.path().join("clip.webm"), b"video").unwrap();

        let info = store.recording_info("clip").unwrap();
        assert_eq!(info.status, SessionStatus::Completed);
        assert_eq!(info.session_id, "clip");

        let path = store.recording_file("clip").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"video");

        assert!(store.list_recordings().is_empty());
    }

    #[test]
    fn list_excludes_incomplete_sessions_and_sorts_by_start_time() {
        let (dir, store) = new_store();

        store.create_session("a", None).unwrap();
        store.append_chunk("a", b"data");
        store.finalize_recording("a").unwrap();

        store.create_session("b", None).unwrap();
        store.append_chunk("b", b"data");
        store.finalize_recording("b").unwrap();

        // Still recording: excluded
        store.create_session("live", None).unwrap();
        // Failed: excluded
        store.create_session("failed", None).unwrap();
        store.finalize_recording("failed");
        // Corrupt metadata: skipped, not fatal
        fs::create_dir_all(dir.path().join("corrupt")).unwrap();
        fs::write(dir.path().join("corrupt/info.json"), "not json").unwrap();

        let recordings = store.list_recordings();
        let ids: Vec<&str> = recordings.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn delete_recording_twice_returns_true_then_false() {
        let (dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"data");
        store.finalize_recording("s1").unwrap();

        assert!(store.delete_recording("s1"));
        assert!(!dir.path().join("s1").exists());
        assert!(store.recording_info("s1").is_none());
        assert!(!store.delete_recording("s1"));
    }

    #[test]
    fn delete_removes_bare_artifact() {
        let (dir, store) = new_store();
        fs::write(dir.path().join("clip.webm"), b"video").unwrap();

        assert!(store.delete_recording("clip"));
        assert!(!dir.path().join("clip.webm").exists());
        assert!(!store.delete_recording("clip"));
    }

    #[test]
    fn delete_tears_down_live_session() {
        let (_dir, store) = new_store();
        store.create_session("s1", None).unwrap();
        store.append_chunk("s1", b"data");

        assert!(store.delete_recording("s1"));
        assert!(!store.append_chunk("s1", b"more"));
    }

    #[test]
    fn concurrent_appends_are_serialized() {
        let (dir, store) = new_store();
        let store = std::sync::Arc::new(store);
        store.create_session("s1", None).unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..5 {
                    assert!(store.append_chunk("s1", &[b'x'; 8]));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let chunks = dir.path().join("s1/chunks");
        for sequence in 0..20 {
            assert!(
                chunks.join(chunk_file_name(sequence)).is_file(),
                "chunk {sequence} missing"
            );
        }

        store.finalize_recording("s1").unwrap();
        let artifact = fs::read(dir.path().join("s1/gameplay_s1.webm")).unwrap();
        assert_eq!(artifact.len(), 20 * 8);
    }

    #[test]
    fn restart_marks_stranded_sessions_failed() {
        let dir = tempdir().unwrap();
        {
            let store = RecordingStore::new(dir.path()).unwrap();
            store.create_session("s1", None).unwrap();
            store.append_chunk("s1", b"data");
            // Process "dies" here: no finalize
        }

        let store = RecordingStore::new(dir.path()).unwrap();
        let info = store.recording_info("s1").unwrap();
        assert_eq!(info.status, SessionStatus::Error);
        assert!(store.list_recordings().is_empty());
        assert!(!store.append_chunk("s1", b"late"));
    }

    #[test]
    fn sweep_reaps_only_idle_sessions() {
        let (_dir, store) = new_store();
        store.create_session("idle", None).unwrap();

        assert_eq!(store.sweep_stale(Duration::from_secs(3600)), 0);
        assert_eq!(store.sweep_stale(Duration::ZERO), 1);

        let info = store.recording_info("idle").unwrap();
        assert_eq!(info.status, SessionStatus::Error);
        assert!(!store.append_chunk("idle", b"late"));
    }
}
