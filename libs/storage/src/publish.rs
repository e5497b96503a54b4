use std::path::Path;

use anyhow::{Context, Result, anyhow};
use opendal::Operator;

use crate::path::{public_url, validate_path};

pub const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Uploads local files and hands back their public address.
#[derive(Clone)]
pub struct Publisher {
    operator: Operator,
    public_base: String,
}

impl Publisher {
    pub fn new(operator: Operator, public_base: impl Into<String>) -> Self {
        Self {
            operator,
            public_base: public_base.into(),
        }
    }

    pub fn public_base(&self) -> &str {
        &self.public_base
    }

    /// Single attempt; the object at `storage_path` is created or replaced.
    pub async fn upload(
        &self,
        local_path: &Path,
        storage_path: &str,
        content_type: &str,
    ) -> Result<String> {
        if !validate_path(storage_path) {
            return Err(anyhow!("invalid storage path: {storage_path}"));
        }

        let data = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("read {}", local_path.display()))?;
        let size = data.len();

        let capability = self.operator.info().full_capability();
        let mut write = self.operator.write_with(storage_path, data);
        if capability.write_with_content_type {
            write = write.content_type(content_type);
        }
        if capability.write_with_cache_control {
            write = write.cache_control(CACHE_CONTROL);
        }
        write
            .await
            .with_context(|| format!("upload {storage_path}"))?;

        tracing::debug!("[storage] uploaded {} ({} bytes)", storage_path, size);
        Ok(public_url(&self.public_base, storage_path))
    }
}
