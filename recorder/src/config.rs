use std::{env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use storage::StorageConfig;

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub capture: Capture,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub publish: Publish,
    #[serde(default)]
    pub callback: Callback,
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
pub struct Auth {
    /// Accepted `X-API-Key` values; empty leaves the API open
    #[serde(default = "default_api_keys")]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    /// Length of one raw segment
    #[serde(default = "default_segment_secs")]
    pub segment_secs: u64,
    /// Parent of every session scratch directory
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Grace period between SIGTERM and SIGKILL
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
    #[serde(default = "default_reconnect_delay_max")]
    pub reconnect_delay_max: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publish {
    /// Base the object keys are appended to, e.g. `https://cdn.example.com`
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Callback {
    /// Sent as `X-API-Key` on every callback
    #[serde(default = "default_callback_api_key")]
    pub api_key: String,
    #[serde(default = "default_callback_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_http_listen() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3001);
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

fn default_api_keys() -> Vec<String> {
    env::var("RECORDER_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .into_iter()
        .collect()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_segment_secs() -> u64 {
    1800
}

fn default_work_dir() -> PathBuf {
    env::temp_dir().join("minaret-recorder")
}

fn default_stop_timeout_secs() -> u64 {
    30
}

fn default_reconnect_delay_max() -> u64 {
    10
}

fn default_public_url() -> String {
    env::var("STORAGE_PUBLIC_URL").unwrap_or_default()
}

fn default_callback_api_key() -> String {
    env::var("RECORDER_API_KEY").unwrap_or_default()
}

fn default_callback_timeout_ms() -> u64 {
    10_000
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

impl Default for Auth {
    fn default() -> Self {
        Self {
            api_keys: default_api_keys(),
        }
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            segment_secs: default_segment_secs(),
            work_dir: default_work_dir(),
            stop_timeout_secs: default_stop_timeout_secs(),
            reconnect_delay_max: default_reconnect_delay_max(),
        }
    }
}

impl Default for Publish {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
        }
    }
}

impl Default for Callback {
    fn default() -> Self {
        Self {
            api_key: default_callback_api_key(),
            timeout_ms: default_callback_timeout_ms(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.capture.segment_secs == 0 {
            return Err(anyhow::anyhow!("capture.segment_secs must be greater than 0"));
        }
        if self.capture.ffmpeg.is_empty() || self.capture.ffprobe.is_empty() {
            return Err(anyhow::anyhow!("capture.ffmpeg and capture.ffprobe are required"));
        }
        if self.publish.public_url.is_empty() {
            return Err(anyhow::anyhow!("publish.public_url is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recorder_config() {
        let cfg: Config = toml::from_str(
            r#"
[http]
listen = "127.0.0.1:3001"

[auth]
api_keys = ["recording-secret"]

[capture]
segment_secs = 600
work_dir = "/var/lib/minaret/recordings"

[storage]
type = "fs"
root = "/srv/minaret"

[publish]
public_url = "https://media.example.com"
"#,
        )
        .unwrap();

        assert_eq!(cfg.http.listen.port(), 3001);
        assert_eq!(cfg.auth.api_keys, vec!["recording-secret".to_string()]);
        assert_eq!(cfg.capture.segment_secs, 600);
        assert_eq!(cfg.capture.ffmpeg, "ffmpeg");
        assert_eq!(cfg.capture.stop_timeout_secs, 30);
        assert_eq!(cfg.storage.kind(), "fs");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_segment() {
        let mut cfg = Config::default();
        cfg.publish.public_url = "https://media.example.com".to_string();
        cfg.capture.segment_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_requires_public_url() {
        let mut cfg = Config::default();
        cfg.publish.public_url = String::new();
        assert!(cfg.validate().is_err());
    }
}
