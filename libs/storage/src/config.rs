use serde::{Deserialize, Serialize};

/// Object storage backend the recorder publishes chunks to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage
    Fs {
        #[serde(default = "default_fs_root")]
        root: String,
    },
    /// AWS S3 or any S3 compatible service
    S3 {
        bucket: String,
        #[serde(default = "default_bucket_root")]
        root: String,
        #[serde(default)]
        region: Option<String>,
        /// Custom endpoint for S3-compatible services
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        access_key_id: Option<String>,
        #[serde(default)]
        secret_access_key: Option<String>,
        #[serde(default)]
        session_token: Option<String>,
        /// Disable config/credential auto-loading
        #[serde(default)]
        disable_config_load: bool,
        #[serde(default)]
        enable_virtual_host_style: bool,
    },
    /// Cloudflare R2, addressed through its S3 endpoint
    R2 {
        account_id: String,
        bucket: String,
        #[serde(default = "default_bucket_root")]
        root: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Fs {
            root: default_fs_root(),
        }
    }
}

impl StorageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::Fs { .. } => "fs",
            StorageConfig::S3 { .. } => "s3",
            StorageConfig::R2 { .. } => "r2",
        }
    }
}

fn default_fs_root() -> String {
    "./storage".to_string()
}

fn default_bucket_root() -> String {
    "/".to_string()
}

pub fn r2_endpoint(account_id: &str) -> String {
    format!("https://{account_id}.r2.cloudflarestorage.com")
}
