use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, trace, warn};

use api::recorder::{ChunkPayload, RecordingCallback, StartRecordingRequest};

use crate::callback::CallbackClient;
use crate::config::Capture;
use crate::processor::SegmentProcessor;
use crate::segment::{capture_pattern, parse_opening, pending_segments};
use crate::session::{RecordingSession, SessionRegistry};

#[derive(Debug)]
pub enum StartError {
    InvalidRecordingId(String),
    InvalidMosqueId(String),
    AlreadyRecording(String),
    Io(std::io::Error),
    Spawn(std::io::Error),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::InvalidRecordingId(id) => write!(f, "invalid recording id: {id}"),
            StartError::InvalidMosqueId(id) => write!(f, "invalid mosque id: {id}"),
            StartError::AlreadyRecording(id) => write!(f, "recording {id} is already active"),
            StartError::Io(e) => write!(f, "failed to prepare session directory: {e}"),
            StartError::Spawn(e) => write!(f, "failed to spawn capture process: {e}"),
        }
    }
}

impl std::error::Error for StartError {}

/// Owns the capture processes of all active sessions.
#[derive(Clone)]
pub struct Supervisor {
    registry: SessionRegistry,
    processor: SegmentProcessor,
    callbacks: CallbackClient,
    capture: Capture,
}

impl Supervisor {
    pub fn new(
        registry: SessionRegistry,
        processor: SegmentProcessor,
        callbacks: CallbackClient,
        capture: Capture,
    ) -> Self {
        Self {
            registry,
            processor,
            callbacks,
            capture,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn capture_args(&self, session: &RecordingSession) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-loglevel".to_string(),
            "info".to_string(),
            "-reconnect".to_string(),
            "1".to_string(),
            "-reconnect_streamed".to_string(),
            "1".to_string(),
            "-reconnect_delay_max".to_string(),
            self.capture.reconnect_delay_max.to_string(),
            "-i".to_string(),
            session.stream_url.clone(),
            "-map".to_string(),
            "0:a:0".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-f".to_string(),
            "segment".to_string(),
            "-segment_time".to_string(),
            self.capture.segment_secs.to_string(),
            "-reset_timestamps".to_string(),
            "1".to_string(),
            capture_pattern(&session.session_dir)
                .to_string_lossy()
                .to_string(),
        ]
    }

    /// Registers the session and spawns its capture process.
    /// Returns as soon as the process runs; finalization happens on exit.
    pub async fn start(
        &self,
        req: &StartRecordingRequest,
    ) -> Result<Arc<RecordingSession>, StartError> {
        if !storage::is_safe_component(&req.recording_id) {
            return Err(StartError::InvalidRecordingId(req.recording_id.clone()));
        }
        // blank falls back to the unassigned tenant
        if let Some(mosque_id) = &req.mosque_id
            && !mosque_id.trim().is_empty()
            && !storage::is_safe_component(mosque_id)
        {
            return Err(StartError::InvalidMosqueId(mosque_id.clone()));
        }

        let (session, stop_rx) = RecordingSession::new(req, &self.capture.work_dir);
        let session = self
            .registry
            .create(session)
            .await
            .ok_or_else(|| StartError::AlreadyRecording(req.recording_id.clone()))?;
        let id = session.recording_id.clone();

        info!(
            "[recorder] [{}] starting capture of {} (hint {}, show {:?}) into {}",
            id,
            session.stream_url,
            session.codec_hint,
            session.show_title,
            session.session_dir.display()
        );

        if let Err(e) = tokio::fs::create_dir_all(&session.session_dir).await {
            let err = StartError::Io(e);
            self.abort(&session, &err).await;
            return Err(err);
        }

        let spawned = Command::new(&self.capture.ffmpeg)
            .args(self.capture_args(&session))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let err = StartError::Spawn(e);
                self.abort(&session, &err).await;
                return Err(err);
            }
        };

        let Some(stderr) = child.stderr.take() else {
            let err = StartError::Spawn(std::io::Error::other("capture stderr not piped"));
            let _ = child.start_kill();
            self.abort(&session, &err).await;
            return Err(err);
        };

        session.mark_running();
        info!("[recorder] [{}] capture spawned with pid {:?}", id, child.id());

        tokio::spawn(self.clone().monitor(session.clone(), child, stderr, stop_rx));
        Ok(session)
    }

    /// Drops a session that never got a running capture process.
    async fn abort(&self, session: &RecordingSession, err: &StartError) {
        let id = session.recording_id.clone();
        error!("[recorder] [{}] {}", id, err);

        self.registry.remove(&id).await;
        if let Err(e) = tokio::fs::remove_dir_all(&session.session_dir).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("[recorder] [{}] remove {} failed: {}", id, session.session_dir.display(), e);
        }

        let callbacks = self.callbacks.clone();
        let url = session.callback_url.clone();
        let body = RecordingCallback::failed(&id, err.to_string());
        tokio::spawn(async move {
            let _ = callbacks.send(&url, &body).await;
        });
    }

    /// Requests a graceful stop. False when the id has no running capture.
    pub async fn stop(&self, recording_id: &str) -> bool {
        match self.registry.get(recording_id).await {
            Some(session) => {
                let requested = session.request_stop();
                if requested {
                    info!("[recorder] [{}] stop requested", recording_id);
                }
                requested
            }
            None => false,
        }
    }

    /// Stops every session and waits for their finalization, bounded by `grace`.
    pub async fn shutdown(&self, grace: Duration) {
        let ids = self.registry.ids().await;
        if ids.is_empty() {
            return;
        }
        info!("[recorder] stopping {} active session(s)", ids.len());
        for id in ids {
            self.stop(&id).await;
        }
        if tokio::time::timeout(grace, self.registry.wait_empty()).await.is_err() {
            warn!("[recorder] sessions still finalizing after {:?}", grace);
        }
    }

    async fn monitor(
        self,
        session: Arc<RecordingSession>,
        mut child: Child,
        stderr: ChildStderr,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        let id = session.recording_id.clone();
        let pid = child.id();
        let mut lines = BufReader::new(stderr).lines();
        let mut stderr_open = true;
        let mut stop_seen = false;
        let mut inflight: JoinSet<SegmentOutcome> = JoinSet::new();
        let mut dispatched = BTreeSet::new();

        let grace = Duration::from_secs(self.capture.stop_timeout_secs);
        let kill_deadline = sleep(Duration::ZERO);
        tokio::pin!(kill_deadline);
        let mut kill_armed = false;

        let status: std::io::Result<ExitStatus> = loop {
            tokio::select! {
                line = lines.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => self.on_line(&session, &line, &mut dispatched, &mut inflight),
                    Ok(None) => stderr_open = false,
                    Err(e) => {
                        debug!("[recorder] [{}] capture stderr closed: {}", id, e);
                        stderr_open = false;
                    }
                },
                res = &mut stop_rx, if !stop_seen => {
                    stop_seen = true;
                    if res.is_ok() {
                        terminate(pid, &id);
                        kill_deadline.as_mut().reset(Instant::now() + grace);
                        kill_armed = true;
                    }
                },
                _ = &mut kill_deadline, if kill_armed => {
                    kill_armed = false;
                    warn!(
                        "[recorder] [{}] capture ignored SIGTERM for {}s, killing",
                        id, self.capture.stop_timeout_secs
                    );
                    kill(pid, &id);
                },
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    log_joined(&id, joined);
                },
                status = child.wait() => break status,
            }
        };

        match status {
            Ok(status) => info!("[recorder] [{}] capture exited with {}", id, status),
            Err(e) => error!("[recorder] [{}] waiting on capture failed: {}", id, e),
        }
        session.detach();

        self.finalize(session, inflight, dispatched).await;
    }

    fn on_line(
        &self,
        session: &Arc<RecordingSession>,
        line: &str,
        dispatched: &mut BTreeSet<u32>,
        inflight: &mut JoinSet<SegmentOutcome>,
    ) {
        let id = &session.recording_id;
        if line.contains("error") || line.contains("Error") {
            warn!("[recorder] [{}] ffmpeg: {}", id, line);
        } else {
            trace!("[recorder] [{}] ffmpeg: {}", id, line);
        }

        let Some(opened) = parse_opening(line) else {
            return;
        };
        session.advance_chunk_index(opened);

        // every segment before the one just opened is complete
        for index in 0..opened {
            if !dispatched.insert(index) {
                continue;
            }
            let raw = session.session_dir.join(crate::segment::raw_filename(index));
            if !raw.exists() {
                debug!("[recorder] [{}] segment {} missing on rollover", id, index);
                dispatched.remove(&index);
                continue;
            }
            debug!("[recorder] [{}] dispatching segment {}", id, index);
            let processor = self.processor.clone();
            let session = session.clone();
            inflight.spawn(async move { (index, processor.process(session, raw, index).await) });
        }
    }

    async fn finalize(
        &self,
        session: Arc<RecordingSession>,
        mut inflight: JoinSet<SegmentOutcome>,
        dispatched: BTreeSet<u32>,
    ) {
        let id = session.recording_id.clone();

        while let Some(joined) = inflight.join_next().await {
            log_joined(&id, joined);
        }

        let dir = &session.session_dir;
        let leftovers: Vec<(u32, PathBuf)> = match pending_segments(dir, &dispatched) {
            Ok(leftovers) => leftovers,
            Err(e) => {
                warn!("[recorder] [{}] scan of {} failed: {}", id, dir.display(), e);
                Vec::new()
            }
        };
        info!("[recorder] [{}] {} segment(s) left to process", id, leftovers.len());
        for (index, raw) in leftovers {
            if let Err(e) = self.processor.process(session.clone(), raw, index).await {
                warn!("[recorder] [{}] segment {} dropped: {:#}", id, index, e);
            }
        }

        let ended_at = Utc::now();
        let total = (ended_at - session.started_at).num_seconds().max(0) as u64;
        info!("[recorder] [{}] recording finished after {}s", id, total);
        if let Err(e) = self
            .callbacks
            .send(&session.callback_url, &RecordingCallback::ready(&id, ended_at, total))
            .await
        {
            error!("[recorder] [{}] final callback failed: {}", id, e);
        }

        if let Err(e) = tokio::fs::remove_dir_all(&session.session_dir).await {
            warn!("[recorder] [{}] remove {} failed: {}", id, session.session_dir.display(), e);
        }
        self.registry.remove(&id).await;
    }
}

type SegmentOutcome = (u32, anyhow::Result<ChunkPayload>);

fn log_joined(id: &str, joined: Result<SegmentOutcome, tokio::task::JoinError>) {
    match joined {
        Ok((index, Ok(chunk))) => {
            debug!("[recorder] [{}] segment {} published as {}", id, index, chunk.filename)
        }
        Ok((index, Err(e))) => warn!("[recorder] [{}] segment {} dropped: {:#}", id, index, e),
        Err(e) => error!("[recorder] [{}] segment task failed: {}", id, e),
    }
}

#[cfg(unix)]
fn send_signal(pid: Option<u32>, signal: libc::c_int) -> std::io::Result<()> {
    let Some(pid) = pid else {
        return Err(std::io::Error::other("capture process has no pid"));
    };
    // SAFETY: plain kill(2) on the pid of a child this task has not reaped yet
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn terminate(pid: Option<u32>, id: &str) {
    match send_signal(pid, libc::SIGTERM) {
        Ok(()) => info!("[recorder] [{}] sent SIGTERM to capture", id),
        Err(e) => warn!("[recorder] [{}] SIGTERM failed: {}", id, e),
    }
}

#[cfg(unix)]
fn kill(pid: Option<u32>, id: &str) {
    if let Err(e) = send_signal(pid, libc::SIGKILL) {
        warn!("[recorder] [{}] SIGKILL failed: {}", id, e);
    }
}

#[cfg(not(unix))]
fn terminate(_pid: Option<u32>, id: &str) {
    warn!("[recorder] [{}] graceful stop unsupported on this platform", id);
}

#[cfg(not(unix))]
fn kill(_pid: Option<u32>, id: &str) {
    warn!("[recorder] [{}] forced stop unsupported on this platform", id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_error_messages() {
        assert_eq!(
            StartError::AlreadyRecording("r1".to_string()).to_string(),
            "recording r1 is already active"
        );
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let spawn = StartError::Spawn(missing);
        assert!(spawn.to_string().starts_with("failed to spawn capture process"));
    }
}
