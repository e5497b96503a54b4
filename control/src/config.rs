use std::{env, net::SocketAddr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub recorder: Recorder,
    #[serde(default)]
    pub relay: Relay,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub recording: Recording,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Http {
    #[serde(default = "default_http_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    pub cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

/// Where the recorder service lives and how to authenticate to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recorder {
    #[serde(default = "default_recorder_url")]
    pub url: String,
    #[serde(default = "default_recorder_api_key")]
    pub api_key: String,
    #[serde(default = "default_recorder_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relay {
    /// Relay address reachable from the recorder, mount points are appended
    #[serde(default = "default_relay_internal_url")]
    pub internal_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Api {
    /// Base the recorder uses to reach this service's callback
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Accepted `X-API-Key` values; empty leaves the API open
    #[serde(default = "default_api_keys")]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Ready recordings shorter than this are deleted
    #[serde(default = "default_discard_min_secs")]
    pub discard_min_secs: u64,
    /// How far ahead a scheduled show may begin and still be picked on mount-add
    #[serde(default = "default_schedule_lookahead_mins")]
    pub schedule_lookahead_mins: i64,
    /// Length of the show synthesized when nothing is scheduled
    #[serde(default = "default_ad_hoc_window_mins")]
    pub ad_hoc_window_mins: i64,
}

fn default_http_listen() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    SocketAddr::from(([0, 0, 0, 0], port))
}

fn default_log_level() -> String {
    env::var("LOG_LEVEL").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    })
}

fn default_database_url() -> String {
    env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://minaret.db?mode=rwc".to_string())
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_recorder_url() -> String {
    env::var("RECORDER_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

fn default_recorder_api_key() -> String {
    env::var("RECORDER_API_KEY").unwrap_or_default()
}

fn default_recorder_timeout_ms() -> u64 {
    5_000
}

fn default_relay_internal_url() -> String {
    env::var("RELAY_INTERNAL_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

fn default_public_url() -> String {
    env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn default_api_keys() -> Vec<String> {
    env::var("RECORDER_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .into_iter()
        .collect()
}

fn default_discard_min_secs() -> u64 {
    60
}

fn default_schedule_lookahead_mins() -> i64 {
    30
}

fn default_ad_hoc_window_mins() -> i64 {
    60
}

impl Default for Http {
    fn default() -> Self {
        Self {
            listen: default_http_listen(),
            cors: Default::default(),
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            url: default_recorder_url(),
            api_key: default_recorder_api_key(),
            timeout_ms: default_recorder_timeout_ms(),
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self {
            internal_url: default_relay_internal_url(),
        }
    }
}

impl Default for Api {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
            api_keys: default_api_keys(),
        }
    }
}

impl Default for Recording {
    fn default() -> Self {
        Self {
            discard_min_secs: default_discard_min_secs(),
            schedule_lookahead_mins: default_schedule_lookahead_mins(),
            ad_hoc_window_mins: default_ad_hoc_window_mins(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.recorder.url.is_empty() {
            return Err(anyhow::anyhow!("recorder.url is required"));
        }
        if self.api.public_url.is_empty() {
            return Err(anyhow::anyhow!("api.public_url is required"));
        }
        if self.recording.ad_hoc_window_mins <= 0 {
            return Err(anyhow::anyhow!("recording.ad_hoc_window_mins must be positive"));
        }
        if self.recording.schedule_lookahead_mins < 0 {
            return Err(anyhow::anyhow!("recording.schedule_lookahead_mins must not be negative"));
        }
        Ok(())
    }

    pub fn callback_url(&self) -> String {
        format!(
            "{}{}",
            self.api.public_url.trim_end_matches('/'),
            api::path::RECORDINGS_CALLBACK
        )
    }

    pub fn stream_url(&self, mount_point: &str) -> String {
        format!("{}{}", self.relay.internal_url.trim_end_matches('/'), mount_point)
    }
}
