use anyhow::Result;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use uuid::Uuid;

use api::recorder::{RecordingCallback, StartRecordingRequest};
use api::recording::{RecordingStatus, Visibility};

use crate::config::Config;
use crate::entity::{recordings, shows, stations};
use crate::recorder_client::RecorderClient;
use crate::service::recordings::RecordingUpdate;
use crate::service::{RecordingsService, StationsService};

#[derive(Debug)]
pub enum CallbackOutcome {
    NotFound,
    /// Ready but shorter than the configured minimum, the recording was deleted
    Discarded,
    Updated(recordings::Model),
}

/// Drives a recording through pending, recording, processing and ready,
/// with failed reachable from pending or recording.
#[derive(Clone)]
pub struct Orchestrator {
    db: DatabaseConnection,
    recorder: RecorderClient,
    config: Config,
}

impl Orchestrator {
    pub fn new(db: DatabaseConnection, recorder: RecorderClient, config: Config) -> Self {
        Self {
            db,
            recorder,
            config,
        }
    }

    /// Creates a pending recording and asks the recorder to capture the
    /// station's mount. The recording is `failed` if the recorder refuses.
    pub async fn trigger_start(
        &self,
        show: &shows::Model,
        station: &stations::Model,
    ) -> Result<Uuid> {
        let recording = RecordingsService::create_pending(&self.db, show, station).await?;
        let recording_id = recording.id;

        let req = StartRecordingRequest {
            recording_id: recording_id.to_string(),
            stream_url: self.config.stream_url(&station.mount_point),
            codec: Some(StationsService::format(station)),
            mosque_id: Some(show.mosque_id.clone()),
            show_title: Some(show.title.clone()),
            callback_url: self.config.callback_url(),
            visibility: Some(Visibility::Public),
        };

        match self.recorder.start(&req).await {
            Ok(_) => {
                RecordingsService::mark_recording(&self.db, recording).await?;
                info!(
                    "[orchestrator] recording {} started for show {} on {}",
                    recording_id, show.id, station.mount_point
                );
                Ok(recording_id)
            }
            Err(err) => {
                warn!("[orchestrator] recording {} failed to start: {}", recording_id, err);
                RecordingsService::mark_failed(&self.db, recording, &err.to_string()).await?;
                Err(err)
            }
        }
    }

    pub async fn on_callback(&self, callback: RecordingCallback) -> Result<CallbackOutcome> {
        let Ok(recording_id) = Uuid::parse_str(&callback.recording_id) else {
            return Ok(CallbackOutcome::NotFound);
        };
        let Some(recording) = RecordingsService::get(&self.db, recording_id).await? else {
            return Ok(CallbackOutcome::NotFound);
        };

        if let Some(chunk) = &callback.chunk {
            RecordingsService::upsert_chunk(&self.db, recording_id, chunk).await?;
        }

        let status = RecordingStatus::from(callback.status);
        let total = callback.total_duration_secs.unwrap_or(0);
        if status == RecordingStatus::Ready && total < self.config.recording.discard_min_secs {
            RecordingsService::delete(&self.db, recording_id).await?;
            info!(
                "[orchestrator] recording {} discarded, {}s is under {}s",
                recording_id, total, self.config.recording.discard_min_secs
            );
            return Ok(CallbackOutcome::Discarded);
        }

        let updated = RecordingsService::update(
            &self.db,
            recording,
            RecordingUpdate {
                status,
                ended_at: callback.ended_at,
                total_duration_secs: callback.total_duration_secs,
                error: callback.error,
            },
        )
        .await?;
        Ok(CallbackOutcome::Updated(updated))
    }

    /// Failures are logged only, the recorder finalizes on its own once the
    /// relay drops the stream.
    pub async fn trigger_stop(&self, recording_id: Uuid) {
        if let Err(err) = self.recorder.stop(&recording_id.to_string()).await {
            warn!("[orchestrator] recording {} stop failed: {}", recording_id, err);
        }
    }
}
