use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Recording as RecordingConfig;
use crate::live::LiveCoordinator;
use crate::service::{ShowsService, StationsService};

#[derive(Debug, PartialEq)]
pub enum MountEvent {
    UnknownMount,
    /// Repeated mount-add while a show is already live
    AlreadyLive,
    ShowStarted {
        show_id: Uuid,
        recording_id: Option<Uuid>,
    },
    /// Mount-remove with nothing live on the station
    StationOffline,
    ShowEnded {
        show_id: Uuid,
    },
}

/// Applies relay mount and listener events to stations and shows. Events may
/// repeat or arrive out of order, none of them is an error.
#[derive(Clone)]
pub struct Reconciler {
    db: DatabaseConnection,
    live: LiveCoordinator,
    config: RecordingConfig,
}

impl Reconciler {
    pub fn new(db: DatabaseConnection, live: LiveCoordinator, config: RecordingConfig) -> Self {
        Self { db, live, config }
    }

    pub async fn mount_add(&self, mount: &str) -> Result<MountEvent> {
        let Some(station) = StationsService::find_by_mount(&self.db, mount).await? else {
            debug!("[reconciler] mount-add for unknown mount {}", mount);
            return Ok(MountEvent::UnknownMount);
        };

        if ShowsService::find_live_for_station(&self.db, station.id)
            .await?
            .is_some()
        {
            StationsService::mark_live(&self.db, station).await?;
            return Ok(MountEvent::AlreadyLive);
        }

        let show = match ShowsService::find_upcoming(
            &self.db,
            station.id,
            Utc::now(),
            Duration::minutes(self.config.schedule_lookahead_mins),
        )
        .await?
        {
            Some(show) => show,
            None => {
                info!("[reconciler] no scheduled show on {}, starting ad-hoc", mount);
                ShowsService::create_ad_hoc(
                    &self.db,
                    &station,
                    Duration::minutes(self.config.ad_hoc_window_mins),
                )
                .await?
            }
        };

        let show = self.live.show_started(show, station).await?;
        Ok(MountEvent::ShowStarted {
            show_id: show.id,
            recording_id: show.recording_id,
        })
    }

    pub async fn mount_remove(&self, mount: &str) -> Result<MountEvent> {
        let Some(station) = StationsService::find_by_mount(&self.db, mount).await? else {
            debug!("[reconciler] mount-remove for unknown mount {}", mount);
            return Ok(MountEvent::UnknownMount);
        };

        let mut live = ShowsService::list_live_for_station(&self.db, station.id)
            .await?
            .into_iter();
        let Some(latest) = live.next() else {
            StationsService::set_offline(&self.db, station).await?;
            return Ok(MountEvent::StationOffline);
        };

        // shows left live by an earlier missed event end with the broadcast
        for stale in live {
            self.live.show_ended(stale, station.clone()).await?;
        }
        let show = self.live.show_ended(latest, station).await?;
        Ok(MountEvent::ShowEnded { show_id: show.id })
    }

    pub async fn listener_add(&self, mount: &str) -> Result<()> {
        if let Some(station) = StationsService::find_by_mount(&self.db, mount).await? {
            StationsService::listener_joined(&self.db, station).await?;
        }
        Ok(())
    }

    pub async fn listener_remove(&self, mount: &str) -> Result<()> {
        if let Some(station) = StationsService::find_by_mount(&self.db, mount).await? {
            StationsService::listener_left(&self.db, station).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use api::recording::RecordingStatus;

    use super::*;
    use crate::config::Config;
    use crate::orchestrator::Orchestrator;
    use crate::recorder_client::RecorderClient;
    use crate::service::{RecordingsService, testing};

    fn reconciler(db: DatabaseConnection) -> Reconciler {
        let mut config = Config::default();
        config.recorder.url = "http://127.0.0.1:1".to_string();
        let recorder =
            RecorderClient::new(&config.recorder.url, "", StdDuration::from_millis(500)).unwrap();
        let orchestrator = Orchestrator::new(db.clone(), recorder, config.clone());
        let live = LiveCoordinator::new(db.clone(), orchestrator);
        Reconciler::new(db, live, config.recording)
    }

    #[tokio::test]
    async fn test_unknown_mount_is_noop() {
        let db = testing::memory_db().await;
        let reconciler = reconciler(db);

        assert_eq!(reconciler.mount_add("/nowhere").await.unwrap(), MountEvent::UnknownMount);
        assert_eq!(
            reconciler.mount_remove("/nowhere").await.unwrap(),
            MountEvent::UnknownMount
        );
        reconciler.listener_add("/nowhere").await.unwrap();
    }

    #[tokio::test]
    async fn test_mount_remove_without_live_show() {
        let db = testing::memory_db().await;
        testing::station(&db, "/masjid").await;
        let reconciler = reconciler(db.clone());

        assert_eq!(
            reconciler.mount_remove("/masjid").await.unwrap(),
            MountEvent::StationOffline
        );
        let station = StationsService::find_by_mount(&db, "/masjid").await.unwrap().unwrap();
        assert!(!station.is_live);
    }

    #[tokio::test]
    async fn test_mount_lifecycle_with_scheduled_show() {
        let db = testing::memory_db().await;
        let station = testing::station(&db, "/masjid").await;
        let show = testing::show(&db, &station, "Friday Khutbah").await;
        let reconciler = reconciler(db.clone());

        // Recorder is unreachable, the broadcast still goes live
        let event = reconciler.mount_add("/masjid").await.unwrap();
        assert_eq!(
            event,
            MountEvent::ShowStarted {
                show_id: show.id,
                recording_id: None
            }
        );

        let station = StationsService::find_by_mount(&db, "/masjid").await.unwrap().unwrap();
        assert!(station.is_live);
        assert_eq!(station.current_track_title.as_deref(), Some("Friday Khutbah"));
        assert_eq!(station.current_track_artist.as_deref(), Some("Sheikh Ahmad"));

        let (recordings, _) = RecordingsService::list(&db, &Default::default()).await.unwrap();
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].status, RecordingStatus::Failed);

        assert_eq!(reconciler.mount_add("/masjid").await.unwrap(), MountEvent::AlreadyLive);

        assert_eq!(
            reconciler.mount_remove("/masjid").await.unwrap(),
            MountEvent::ShowEnded { show_id: show.id }
        );
        let ended = ShowsService::get(&db, show.id).await.unwrap().unwrap();
        assert!(!ended.is_live);
        assert!(ended.actual_end.is_some());

        let station = StationsService::find_by_mount(&db, "/masjid").await.unwrap().unwrap();
        assert!(!station.is_live);
        assert!(station.current_track_title.is_none());

        assert_eq!(
            reconciler.mount_remove("/masjid").await.unwrap(),
            MountEvent::StationOffline
        );
    }

    #[tokio::test]
    async fn test_mount_add_without_schedule_creates_ad_hoc_show() {
        let db = testing::memory_db().await;
        let station = testing::station(&db, "/masjid").await;
        let reconciler = reconciler(db.clone());

        let MountEvent::ShowStarted { show_id, .. } = reconciler.mount_add("/masjid").await.unwrap()
        else {
            panic!("expected a started show");
        };
        let show = ShowsService::get(&db, show_id).await.unwrap().unwrap();
        assert_eq!(show.title, crate::service::shows::AD_HOC_TITLE);
        assert_eq!(show.station_id, station.id);
        assert!(show.is_live);
        assert_eq!(
            show.scheduled_end.with_timezone(&Utc) - show.scheduled_start.with_timezone(&Utc),
            Duration::minutes(60)
        );
    }

    #[tokio::test]
    async fn test_operator_start_supersedes_ad_hoc_show() {
        let db = testing::memory_db().await;
        let station = testing::station(&db, "/masjid").await;
        let reconciler = reconciler(db.clone());

        let MountEvent::ShowStarted {
            show_id: ad_hoc_id,
            ..
        } = reconciler.mount_add("/masjid").await.unwrap()
        else {
            panic!("expected a started show");
        };

        // operator starts the scheduled show while the ad-hoc one is on air
        let scheduled = testing::show(&db, &station, "Tafsir").await;
        let station = StationsService::find_by_mount(&db, "/masjid").await.unwrap().unwrap();
        reconciler.live.show_started(scheduled.clone(), station).await.unwrap();

        let ad_hoc = ShowsService::get(&db, ad_hoc_id).await.unwrap().unwrap();
        assert!(!ad_hoc.is_live);
        assert!(ad_hoc.actual_end.is_some());
        let live = ShowsService::list_live_for_station(&db, scheduled.station_id)
            .await
            .unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, scheduled.id);

        assert_eq!(
            reconciler.mount_remove("/masjid").await.unwrap(),
            MountEvent::ShowEnded {
                show_id: scheduled.id
            }
        );

        // the next broadcast starts a show of its own
        let next = reconciler.mount_add("/masjid").await.unwrap();
        assert_ne!(next, MountEvent::AlreadyLive);
        assert!(matches!(next, MountEvent::ShowStarted { .. }));

        let (recordings, total) = RecordingsService::list(&db, &Default::default()).await.unwrap();
        assert_eq!(recordings.len(), 3);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_mount_remove_ends_every_live_show() {
        let db = testing::memory_db().await;
        let station = testing::station(&db, "/masjid").await;
        let first = testing::show(&db, &station, "Fajr reminder").await;
        let second = testing::show(&db, &station, "Tafsir").await;
        ShowsService::mark_started(&db, first.clone()).await.unwrap();
        ShowsService::mark_started(&db, second.clone()).await.unwrap();
        let reconciler = reconciler(db.clone());

        assert!(matches!(
            reconciler.mount_remove("/masjid").await.unwrap(),
            MountEvent::ShowEnded { .. }
        ));
        for id in [first.id, second.id] {
            let show = ShowsService::get(&db, id).await.unwrap().unwrap();
            assert!(!show.is_live);
        }
        assert!(matches!(
            reconciler.mount_add("/masjid").await.unwrap(),
            MountEvent::ShowStarted { .. }
        ));
    }

    #[tokio::test]
    async fn test_listener_counters() {
        let db = testing::memory_db().await;
        testing::station(&db, "/masjid").await;
        let reconciler = reconciler(db.clone());

        reconciler.listener_add("/masjid").await.unwrap();
        reconciler.listener_add("/masjid").await.unwrap();
        reconciler.listener_remove("/masjid").await.unwrap();
        reconciler.listener_remove("/masjid").await.unwrap();
        reconciler.listener_remove("/masjid").await.unwrap();

        let station = StationsService::find_by_mount(&db, "/masjid").await.unwrap().unwrap();
        assert_eq!(station.listeners, 0);
        assert_eq!(station.peak_listeners, 2);
        assert_eq!(station.total_listeners, 2);
    }
}
