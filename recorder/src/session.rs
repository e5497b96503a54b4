use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock, oneshot};

use api::recorder::{SessionStatus, StartRecordingRequest, StreamFormat};
use api::recording::Visibility;

/// Stop side of a session's capture. Present from creation until the
/// capture process has exited, so a stop requested while the process is
/// still spawning is delivered once it runs.
struct CaptureHandle {
    stop_tx: Option<oneshot::Sender<()>>,
}

pub struct RecordingSession {
    pub recording_id: String,
    pub stream_url: String,
    pub codec_hint: StreamFormat,
    pub mosque_id: Option<String>,
    pub show_title: Option<String>,
    pub callback_url: String,
    pub visibility: Visibility,
    pub session_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    chunk_index: AtomicU32,
    running: AtomicBool,
    process: Mutex<Option<CaptureHandle>>,
}

impl RecordingSession {
    /// Builds the session along with the receiver its capture monitor
    /// listens on for stop requests.
    pub fn new(req: &StartRecordingRequest, work_dir: &Path) -> (Self, oneshot::Receiver<()>) {
        let (stop_tx, stop_rx) = oneshot::channel();
        let session = Self {
            recording_id: req.recording_id.clone(),
            stream_url: req.stream_url.clone(),
            codec_hint: req.codec.unwrap_or_default(),
            mosque_id: req.mosque_id.clone(),
            show_title: req.show_title.clone(),
            callback_url: req.callback_url.clone(),
            visibility: req.visibility.unwrap_or_default(),
            session_dir: work_dir.join(&req.recording_id),
            started_at: Utc::now(),
            chunk_index: AtomicU32::new(0),
            running: AtomicBool::new(false),
            process: Mutex::new(Some(CaptureHandle {
                stop_tx: Some(stop_tx),
            })),
        };
        (session, stop_rx)
    }

    /// Index of the segment currently being written
    pub fn chunk_index(&self) -> u32 {
        self.chunk_index.load(Ordering::Acquire)
    }

    pub(crate) fn advance_chunk_index(&self, index: u32) {
        self.chunk_index.fetch_max(index, Ordering::AcqRel);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Capture process spawned
    pub(crate) fn mark_running(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// Capture process exited, later stop requests find nothing to stop
    pub(crate) fn detach(&self) {
        self.running.store(false, Ordering::Release);
        if let Ok(mut process) = self.process.lock() {
            process.take();
        }
    }

    /// Asks the supervisor to terminate the capture process.
    /// Returns false once the process has exited.
    pub(crate) fn request_stop(&self) -> bool {
        let Ok(mut process) = self.process.lock() else {
            return false;
        };
        match process.as_mut() {
            Some(handle) => {
                if let Some(tx) = handle.stop_tx.take() {
                    let _ = tx.send(());
                }
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            recording_id: self.recording_id.clone(),
            stream_url: self.stream_url.clone(),
            chunk_index: self.chunk_index(),
            started_at: self.started_at,
            is_running: self.is_running(),
        }
    }
}

/// Active sessions keyed by recording id
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<RecordingSession>>>>,
    emptied: Arc<Notify>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the session unless its id is already present.
    pub async fn create(&self, session: RecordingSession) -> Option<Arc<RecordingSession>> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(session.recording_id.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => Some(v.insert(Arc::new(session)).clone()),
        }
    }

    pub async fn get(&self, recording_id: &str) -> Option<Arc<RecordingSession>> {
        self.sessions.read().await.get(recording_id).cloned()
    }

    pub async fn remove(&self, recording_id: &str) -> Option<Arc<RecordingSession>> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(recording_id);
        if sessions.is_empty() {
            self.emptied.notify_waiters();
        }
        removed
    }

    pub async fn list_status(&self) -> Vec<SessionStatus> {
        let mut statuses: Vec<SessionStatus> = self
            .sessions
            .read()
            .await
            .values()
            .map(|s| s.status())
            .collect();
        statuses.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        statuses
    }

    pub async fn ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Resolves once no session is left.
    pub async fn wait_empty(&self) {
        loop {
            let notified = self.emptied.notified();
            if self.is_empty().await {
                return;
            }
            notified.await;
        }
    }
}
