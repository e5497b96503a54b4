use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recorder::AudioCodec;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    #[default]
    Pending,
    Recording,
    Processing,
    Ready,
    Failed,
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordingStatus::Pending => "pending",
            RecordingStatus::Recording => "recording",
            RecordingStatus::Processing => "processing",
            RecordingStatus::Ready => "ready",
            RecordingStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for RecordingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RecordingStatus::Pending),
            "recording" => Ok(RecordingStatus::Recording),
            "processing" => Ok(RecordingStatus::Processing),
            "ready" => Ok(RecordingStatus::Ready),
            "failed" => Ok(RecordingStatus::Failed),
            _ => Err(format!("unknown recording status: {s}")),
        }
    }
}

impl From<crate::recorder::CallbackStatus> for RecordingStatus {
    fn from(status: crate::recorder::CallbackStatus) -> Self {
        use crate::recorder::CallbackStatus;
        match status {
            CallbackStatus::Recording => RecordingStatus::Recording,
            CallbackStatus::Processing => RecordingStatus::Processing,
            CallbackStatus::Ready => RecordingStatus::Ready,
            CallbackStatus::Failed => RecordingStatus::Failed,
        }
    }
}

/// Storage namespace of a recording
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(format!("unknown visibility: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub index: u32,
    pub filename: String,
    pub storage_path: String,
    pub public_url: String,
    pub codec: AudioCodec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,
    pub show_id: String,
    pub station_id: String,
    pub mosque_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    pub status: RecordingStatus,
    pub visibility: Visibility,
    pub chunks: Vec<Chunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingList {
    pub results: usize,
    pub total: u64,
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackChunk {
    pub index: u32,
    pub url: String,
    pub codec: AudioCodec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// `GET /api/v1/recordings/{id}/playback`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    pub recording_id: String,
    pub total_duration_secs: Option<u64>,
    pub chunks: Vec<PlaybackChunk>,
}

impl From<&Recording> for Playback {
    fn from(recording: &Recording) -> Self {
        Self {
            recording_id: recording.id.clone(),
            total_duration_secs: recording.total_duration_secs,
            chunks: recording
                .chunks
                .iter()
                .map(|c| PlaybackChunk {
                    index: c.index,
                    url: c.public_url.clone(),
                    codec: c.codec,
                    duration_secs: c.duration_secs,
                })
                .collect(),
        }
    }
}
