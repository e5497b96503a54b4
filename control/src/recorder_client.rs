use std::time::Duration;

use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::{debug, warn};

use api::recorder::{StartRecordingRequest, StartRecordingResponse};

/// HTTP client for the recorder service
#[derive(Clone, Debug)]
pub struct RecorderClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RecorderClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(3))
                .timeout(timeout)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn start(&self, req: &StartRecordingRequest) -> Result<StartRecordingResponse> {
        let url = format!("{}{}", self.base_url, api::path::START);
        let response = self
            .client
            .post(&url)
            .header(auth::API_KEY_HEADER, &self.api_key)
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let res_body = response.text().await.unwrap_or_default();
            warn!(url, recording_id = %req.recording_id, ?status, res_body, "recorder start error");
            return Err(anyhow!("Recording service responded with {}", status.as_u16()));
        }

        let body = response.json::<StartRecordingResponse>().await?;
        debug!(url, recording_id = %body.recording_id, "recorder start success");
        Ok(body)
    }

    pub async fn stop(&self, recording_id: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, api::path::stop(recording_id));
        let response = self
            .client
            .post(&url)
            .header(auth::API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(url, recording_id, "recorder stop success");
            Ok(())
        } else {
            Err(anyhow!("Recording service responded with {}", status.as_u16()))
        }
    }
}
