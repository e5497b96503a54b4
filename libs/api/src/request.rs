use serde::{Deserialize, Serialize};

use crate::recording::RecordingStatus;

fn default_limit() -> u64 {
    20
}

/// `GET /api/v1/recordings`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordingsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mosque_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl RecordingsQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or_else(default_limit)
    }
}

/// `GET /api/v1/recordings/public`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicRecordingsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mosque_id: Option<String>,
}

impl PublicRecordingsQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or_else(default_limit).clamp(1, 100)
    }

    pub fn skip(&self) -> u64 {
        self.skip.unwrap_or(0)
    }
}

/// Tenant scoping for `DELETE /api/v1/recordings/{id}`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuery {
    pub mosque_id: String,
}
