use anyhow::Result;
use opendal::Operator;
use opendal::services;

use crate::config::{StorageConfig, r2_endpoint};

/// Create storage operator based on storage configuration
pub fn create_operator(config: &StorageConfig) -> Result<Operator> {
    tracing::debug!("[storage] creating operator for {} backend", config.kind());

    match config {
        StorageConfig::Fs { root } => {
            tracing::info!("[storage] filesystem root: {}", root);
            let builder = services::Fs::default().root(root);
            Ok(Operator::new(builder)?.finish())
        }
        StorageConfig::S3 {
            bucket,
            root,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            session_token,
            disable_config_load,
            enable_virtual_host_style,
        } => {
            tracing::info!("[storage] s3 bucket: {}, region: {:?}", bucket, region);

            let mut builder = services::S3::default()
                .bucket(bucket)
                .root(root.trim_start_matches('/'));

            if let Some(region) = region {
                builder = builder.region(region);
            }
            if let Some(endpoint) = endpoint {
                builder = builder.endpoint(endpoint);
                tracing::debug!("[storage] s3 endpoint: {}", endpoint);
            }
            if let Some(access_key_id) = access_key_id {
                builder = builder.access_key_id(access_key_id);
            }
            if let Some(secret_access_key) = secret_access_key {
                builder = builder.secret_access_key(secret_access_key);
            }
            if let Some(session_token) = session_token {
                builder = builder.session_token(session_token);
            }
            if *disable_config_load {
                builder = builder.disable_config_load();
            }
            if *enable_virtual_host_style {
                builder = builder.enable_virtual_host_style();
            }

            Ok(Operator::new(builder)?.finish())
        }
        StorageConfig::R2 {
            account_id,
            bucket,
            root,
            access_key_id,
            secret_access_key,
        } => {
            let endpoint = r2_endpoint(account_id);
            tracing::info!("[storage] r2 bucket: {}, endpoint: {}", bucket, endpoint);

            let builder = services::S3::default()
                .bucket(bucket)
                .root(root.trim_start_matches('/'))
                .region("auto")
                .endpoint(&endpoint)
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key)
                .disable_config_load();

            Ok(Operator::new(builder)?.finish())
        }
    }
}

/// Initialize storage operator with connection test
pub async fn init_operator(config: &StorageConfig) -> Result<Operator> {
    let operator = create_operator(config)?;

    match operator.check().await {
        Ok(_) => tracing::info!("[storage] {} backend verified", config.kind()),
        Err(e) => tracing::warn!(
            "[storage] {} backend connection test failed: {}, continuing anyway",
            config.kind(),
            e
        ),
    }

    Ok(operator)
}
