use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::process::Command;
use tracing::{debug, info, warn};

use api::recorder::{AudioCodec, ChunkPayload, RecordingCallback};
use storage::{Publisher, recording_object_path};

use crate::callback::CallbackClient;
use crate::segment::output_filename;
use crate::session::RecordingSession;

/// Turns one finished raw segment into a published chunk.
#[derive(Clone)]
pub struct SegmentProcessor {
    ffmpeg: String,
    ffprobe: String,
    publisher: Publisher,
    callbacks: CallbackClient,
}

impl SegmentProcessor {
    pub fn new(
        ffmpeg: &str,
        ffprobe: &str,
        publisher: Publisher,
        callbacks: CallbackClient,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
            publisher,
            callbacks,
        }
    }

    /// Probe, remux, upload and report segment `index`.
    /// The raw and remuxed files are removed whatever the outcome.
    pub async fn process(
        &self,
        session: Arc<RecordingSession>,
        raw: PathBuf,
        index: u32,
    ) -> Result<ChunkPayload> {
        let id = &session.recording_id;
        info!("[recorder] [{}] processing chunk {}: {}", id, index, raw.display());

        let codec = self.probe_codec(&raw).await;
        let filename = output_filename(index, codec);
        let out = session.session_dir.join(&filename);

        let result = self.publish(&session, &raw, &out, index, codec, filename).await;

        for path in [&raw, &out] {
            if let Err(e) = tokio::fs::remove_file(path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!("[recorder] [{}] cleanup {} failed: {}", id, path.display(), e);
            }
        }

        result
    }

    async fn publish(
        &self,
        session: &RecordingSession,
        raw: &Path,
        out: &Path,
        index: u32,
        codec: AudioCodec,
        filename: String,
    ) -> Result<ChunkPayload> {
        let id = &session.recording_id;
        self.remux(raw, out, codec).await?;

        let storage_path = recording_object_path(
            &session.visibility.to_string(),
            session.mosque_id.as_deref(),
            id,
            &filename,
        );
        let public_url = self
            .publisher
            .upload(out, &storage_path, codec.content_type())
            .await?;
        info!("[recorder] [{}] uploaded chunk {}: {}", id, index, public_url);

        let size_bytes = tokio::fs::metadata(out).await.ok().map(|m| m.len());
        let duration_secs = self.probe_duration(out).await;

        let chunk = ChunkPayload {
            index,
            filename,
            storage_path,
            public_url,
            codec,
            duration_secs,
            size_bytes,
        };

        if let Err(e) = self
            .callbacks
            .send(&session.callback_url, &RecordingCallback::chunk(id, chunk.clone()))
            .await
        {
            warn!("[recorder] [{}] chunk {} callback failed: {}", id, index, e);
        }

        Ok(chunk)
    }

    /// Anything that is not AAC, including a failed probe, is treated as MP3.
    pub async fn probe_codec(&self, path: &Path) -> AudioCodec {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=codec_name",
                "-of",
                "default=nokey=1:noprint_wrappers=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let codec = AudioCodec::from_probe(&String::from_utf8_lossy(&output.stdout));
                debug!("[recorder] probed {} as {}", path.display(), codec);
                codec
            }
            Err(e) => {
                warn!("[recorder] codec probe of {} failed: {}", path.display(), e);
                AudioCodec::Mp3
            }
        }
    }

    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=nokey=1:noprint_wrappers=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
    }

    /// Stream copy into the delivery container, no re-encode.
    async fn remux(&self, raw: &Path, out: &Path, codec: AudioCodec) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(raw)
            .args(["-vn", "-c:a", "copy"]);
        if codec == AudioCodec::Aac {
            cmd.args(["-f", "ipod"]);
        }
        cmd.arg(out).stdin(Stdio::null());

        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawn {}", self.ffmpeg))?;

        if !output.status.success() {
            return Err(anyhow!(
                "remux of {} failed with {}: {}",
                raw.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(())
    }
}
