use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recording::Visibility;

/// Delivery codec of an uploaded chunk
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    #[default]
    Mp3,
    Aac,
}

impl AudioCodec {
    /// Anything that is not AAC is delivered as MP3.
    pub fn from_probe(codec_name: &str) -> Self {
        if codec_name.trim().to_ascii_lowercase().contains("aac") {
            AudioCodec::Aac
        } else {
            AudioCodec::Mp3
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "m4a",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "audio/mpeg",
            AudioCodec::Aac => "audio/mp4",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCodec::Mp3 => write!(f, "mp3"),
            AudioCodec::Aac => write!(f, "aac"),
        }
    }
}

impl FromStr for AudioCodec {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp3" => Ok(AudioCodec::Mp3),
            "aac" => Ok(AudioCodec::Aac),
            _ => Err(()),
        }
    }
}

/// Format a station broadcasts in, used as the recorder's codec hint
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    #[default]
    Mp3,
    Ogg,
    Aac,
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFormat::Mp3 => write!(f, "mp3"),
            StreamFormat::Ogg => write!(f, "ogg"),
            StreamFormat::Aac => write!(f, "aac"),
        }
    }
}

impl FromStr for StreamFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp3" => Ok(StreamFormat::Mp3),
            "ogg" => Ok(StreamFormat::Ogg),
            "aac" => Ok(StreamFormat::Aac),
            _ => Err(()),
        }
    }
}

/// `POST /start` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingRequest {
    #[serde(default)]
    pub recording_id: String,
    #[serde(default)]
    pub stream_url: String,
    #[serde(default)]
    pub codec: Option<StreamFormat>,
    #[serde(default)]
    pub mosque_id: Option<String>,
    #[serde(default)]
    pub show_title: Option<String>,
    #[serde(default)]
    pub callback_url: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl StartRecordingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.recording_id.trim().is_empty()
            || self.stream_url.trim().is_empty()
            || self.callback_url.trim().is_empty()
        {
            return Err("Missing required fields".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingResponse {
    pub status: String,
    pub message: String,
    pub recording_id: String,
}

/// Snapshot of one active capture session, `GET /status/{recordingId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub recording_id: String,
    pub stream_url: String,
    pub chunk_index: u32,
    pub started_at: DateTime<Utc>,
    pub is_running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsStatusResponse {
    pub sessions: Vec<SessionStatus>,
}

/// Status reported by the recorder in a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Recording,
    Processing,
    Ready,
    Failed,
}

/// One uploaded segment as reported to the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    pub index: u32,
    pub filename: String,
    pub storage_path: String,
    pub public_url: String,
    pub codec: AudioCodec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// `POST /api/v1/recordings/callback` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingCallback {
    pub recording_id: String,
    pub status: CallbackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<u64>,
}

impl RecordingCallback {
    pub fn chunk(recording_id: &str, chunk: ChunkPayload) -> Self {
        Self {
            recording_id: recording_id.to_string(),
            status: CallbackStatus::Recording,
            chunk: Some(chunk),
            error: None,
            ended_at: None,
            total_duration_secs: None,
        }
    }

    pub fn ready(recording_id: &str, ended_at: DateTime<Utc>, total_duration_secs: u64) -> Self {
        Self {
            recording_id: recording_id.to_string(),
            status: CallbackStatus::Ready,
            chunk: None,
            error: None,
            ended_at: Some(ended_at),
            total_duration_secs: Some(total_duration_secs),
        }
    }

    pub fn failed(recording_id: &str, error: String) -> Self {
        Self {
            recording_id: recording_id.to_string(),
            status: CallbackStatus::Failed,
            chunk: None,
            error: Some(error),
            ended_at: None,
            total_duration_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_from_probe() {
        assert_eq!(AudioCodec::from_probe("aac\n"), AudioCodec::Aac);
        assert_eq!(AudioCodec::from_probe("AAC_LATM"), AudioCodec::Aac);
        assert_eq!(AudioCodec::from_probe("mp3"), AudioCodec::Mp3);
        assert_eq!(AudioCodec::from_probe("vorbis"), AudioCodec::Mp3);
        assert_eq!(AudioCodec::from_probe(""), AudioCodec::Mp3);
    }

    #[test]
    fn test_start_request_missing_fields() {
        let req: StartRecordingRequest =
            serde_json::from_str(r#"{"recordingId":"r1","streamUrl":"http://relay/m"}"#).unwrap();
        assert_eq!(req.validate(), Err("Missing required fields".to_string()));

        let req: StartRecordingRequest = serde_json::from_str(
            r#"{"recordingId":"r1","streamUrl":"http://relay/m","callbackUrl":"http://api/cb"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.codec, None);
    }

    #[test]
    fn test_callback_rejects_unknown_status() {
        let result = serde_json::from_str::<RecordingCallback>(
            r#"{"recordingId":"r1","status":"pending"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_callback_rejects_unknown_codec() {
        let result = serde_json::from_str::<RecordingCallback>(
            r#"{"recordingId":"r1","status":"recording","chunk":{"index":0,"filename":"a.ogg","storagePath":"p","publicUrl":"u","codec":"ogg"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ready_callback_wire_format() {
        let ended_at = DateTime::parse_from_rfc3339("2025-01-01T10:00:42Z")
            .unwrap()
            .with_timezone(&Utc);
        let value = serde_json::to_value(RecordingCallback::ready("r1", ended_at, 42)).unwrap();
        assert_eq!(value["status"], "ready");
        assert_eq!(value["totalDurationSecs"], 42);
        assert_eq!(value["endedAt"], "2025-01-01T10:00:42Z");
        assert!(value.get("chunk").is_none());
    }
}
