use anyhow::Result;
use sea_orm::DatabaseConnection;
use tracing::{error, info};

use crate::entity::{shows, stations};
use crate::orchestrator::Orchestrator;
use crate::service::{ShowsService, StationsService};

/// Show started/ended choreography shared by operator actions and relay hooks
#[derive(Clone)]
pub struct LiveCoordinator {
    db: DatabaseConnection,
    orchestrator: Orchestrator,
}

impl LiveCoordinator {
    pub fn new(db: DatabaseConnection, orchestrator: Orchestrator) -> Self {
        Self { db, orchestrator }
    }

    /// Marks the show live, starts a recording when enabled and puts the
    /// show on the station's now-playing. A recording that fails to start
    /// does not stop the broadcast.
    ///
    /// A station carries one live show at a time: any other show still live
    /// on it is ended first and its recording stopped.
    pub async fn show_started(
        &self,
        show: shows::Model,
        station: stations::Model,
    ) -> Result<shows::Model> {
        for other in ShowsService::list_live_for_station(&self.db, station.id).await? {
            if other.id != show.id {
                info!("[live] show {} superseded by {}", other.id, show.id);
                self.end(other).await?;
            }
        }

        let mut show = ShowsService::mark_started(&self.db, show).await?;

        if show.recording_enabled {
            match self.orchestrator.trigger_start(&show, &station).await {
                Ok(recording_id) => {
                    show = ShowsService::set_recording(&self.db, show, recording_id).await?;
                }
                Err(err) => {
                    error!("[live] show {} recording not started: {}", show.id, err);
                }
            }
        }

        StationsService::set_live(&self.db, station, &show.title, show.host_name.clone()).await?;
        info!("[live] show {} started", show.id);
        Ok(show)
    }

    /// Ends the show, stops its recording and takes the station offline
    pub async fn show_ended(
        &self,
        show: shows::Model,
        station: stations::Model,
    ) -> Result<shows::Model> {
        let show = self.end(show).await?;
        StationsService::set_offline(&self.db, station).await?;
        Ok(show)
    }

    async fn end(&self, show: shows::Model) -> Result<shows::Model> {
        let show = ShowsService::mark_ended(&self.db, show).await?;

        if let Some(recording_id) = show.recording_id {
            self.orchestrator.trigger_stop(recording_id).await;
        }

        info!("[live] show {} ended", show.id);
        Ok(show)
    }
}
