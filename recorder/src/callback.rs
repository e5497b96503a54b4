use std::time::Duration;

use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::{debug, warn};

use api::recorder::RecordingCallback;

/// Reports session progress back to the control plane.
#[derive(Clone, Debug)]
pub struct CallbackClient {
    client: Client,
    api_key: Option<String>,
}

impl CallbackClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(3))
                .timeout(timeout)
                .build()?,
            api_key: Some(api_key.to_string()).filter(|k| !k.is_empty()),
        })
    }

    /// Single attempt, never retried.
    pub async fn send(&self, url: &str, body: &RecordingCallback) -> Result<()> {
        let mut req = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            req = req.header(auth::API_KEY_HEADER, key);
        }

        match req.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!(
                        url,
                        recording_id = %body.recording_id,
                        ?status,
                        "recording callback success"
                    );
                    Ok(())
                } else {
                    let res_body = response.text().await.unwrap_or_default();
                    warn!(
                        url,
                        recording_id = %body.recording_id,
                        ?status,
                        res_body,
                        "recording callback error"
                    );
                    Err(anyhow!("callback rejected with {status}: {res_body}"))
                }
            }
            Err(err) => {
                warn!(url, recording_id = %body.recording_id, ?err, "recording callback error");
                Err(err.into())
            }
        }
    }
}
