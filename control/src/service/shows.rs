use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::shows::{self, Entity as Shows};
use crate::entity::stations;
use crate::service::now;

/// Title given to shows synthesized for an unscheduled broadcast
pub const AD_HOC_TITLE: &str = "Live Stream";

#[derive(Debug, Clone)]
pub struct NewShow {
    pub station_id: Uuid,
    pub mosque_id: String,
    pub title: String,
    pub host_name: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub recording_enabled: bool,
}

pub struct ShowsService;

impl ShowsService {
    pub async fn create(db: &DatabaseConnection, show: NewShow) -> Result<shows::Model> {
        let model = shows::ActiveModel {
            id: Set(Uuid::new_v4()),
            station_id: Set(show.station_id),
            mosque_id: Set(show.mosque_id),
            title: Set(show.title),
            host_name: Set(show.host_name),
            scheduled_start: Set(show.scheduled_start.into()),
            scheduled_end: Set(show.scheduled_end.into()),
            is_live: Set(false),
            actual_start: Set(None),
            actual_end: Set(None),
            recording_enabled: Set(show.recording_enabled),
            recording_id: Set(None),
            created_at: Set(now()),
            updated_at: Set(now()),
        };
        Ok(model.insert(db).await?)
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<Option<shows::Model>> {
        Ok(Shows::find_by_id(id).one(db).await?)
    }

    /// Live shows on the station, most recently started first
    pub async fn list_live_for_station(
        db: &DatabaseConnection,
        station_id: Uuid,
    ) -> Result<Vec<shows::Model>> {
        let mut shows = Shows::find()
            .filter(shows::Column::StationId.eq(station_id))
            .filter(shows::Column::IsLive.eq(true))
            .all(db)
            .await?;

        shows.sort_by_key(|s| std::cmp::Reverse(s.actual_start.map(|t| t.with_timezone(&Utc))));
        Ok(shows)
    }

    /// Most recently started live show on the station
    pub async fn find_live_for_station(
        db: &DatabaseConnection,
        station_id: Uuid,
    ) -> Result<Option<shows::Model>> {
        Ok(Self::list_live_for_station(db, station_id)
            .await?
            .into_iter()
            .next())
    }

    /// Earliest show that has not run yet, has not passed its scheduled end,
    /// and starts within `lookahead` of `at`.
    pub async fn find_upcoming(
        db: &DatabaseConnection,
        station_id: Uuid,
        at: DateTime<Utc>,
        lookahead: Duration,
    ) -> Result<Option<shows::Model>> {
        let candidates = Shows::find()
            .filter(shows::Column::StationId.eq(station_id))
            .filter(shows::Column::IsLive.eq(false))
            .filter(shows::Column::ActualEnd.is_null())
            .order_by_asc(shows::Column::ScheduledStart)
            .all(db)
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|s| is_upcoming(s, at, lookahead))
            .min_by_key(|s| s.scheduled_start.with_timezone(&Utc)))
    }

    pub async fn create_ad_hoc(
        db: &DatabaseConnection,
        station: &stations::Model,
        window: Duration,
    ) -> Result<shows::Model> {
        let start = Utc::now();
        Self::create(
            db,
            NewShow {
                station_id: station.id,
                mosque_id: station.mosque_id.clone(),
                title: AD_HOC_TITLE.to_string(),
                host_name: None,
                scheduled_start: start,
                scheduled_end: start + window,
                recording_enabled: true,
            },
        )
        .await
    }

    pub async fn mark_started(db: &DatabaseConnection, show: shows::Model) -> Result<shows::Model> {
        let mut active: shows::ActiveModel = show.into();
        active.is_live = Set(true);
        active.actual_start = Set(Some(now()));
        active.actual_end = Set(None);
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn mark_ended(db: &DatabaseConnection, show: shows::Model) -> Result<shows::Model> {
        let mut active: shows::ActiveModel = show.into();
        active.is_live = Set(false);
        active.actual_end = Set(Some(now()));
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn set_recording(
        db: &DatabaseConnection,
        show: shows::Model,
        recording_id: Uuid,
    ) -> Result<shows::Model> {
        let mut active: shows::ActiveModel = show.into();
        active.recording_id = Set(Some(recording_id));
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }
}

fn is_upcoming(show: &shows::Model, at: DateTime<Utc>, lookahead: Duration) -> bool {
    show.scheduled_end.with_timezone(&Utc) > at
        && show.scheduled_start.with_timezone(&Utc) <= at + lookahead
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(start_in: i64, end_in: i64) -> shows::Model {
        let at = Utc::now();
        shows::Model {
            id: Uuid::new_v4(),
            station_id: Uuid::new_v4(),
            mosque_id: "m1".to_string(),
            title: "Jumu'ah khutbah".to_string(),
            host_name: Some("Imam".to_string()),
            scheduled_start: (at + Duration::minutes(start_in)).into(),
            scheduled_end: (at + Duration::minutes(end_in)).into(),
            is_live: false,
            actual_start: None,
            actual_end: None,
            recording_enabled: true,
            recording_id: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_upcoming_window() {
        let at = Utc::now();
        let lookahead = Duration::minutes(30);

        assert!(is_upcoming(&show(10, 70), at, lookahead));
        assert!(is_upcoming(&show(-20, 40), at, lookahead));
        assert!(!is_upcoming(&show(45, 90), at, lookahead));
        assert!(!is_upcoming(&show(-90, -30), at, lookahead));
    }
}
