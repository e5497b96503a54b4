use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::debug;
use uuid::Uuid;

use api::recorder::StreamFormat;

use crate::entity::stations::{self, Entity as Stations};
use crate::service::now;

#[derive(Debug, Clone)]
pub struct NewStation {
    pub mosque_id: String,
    pub name: String,
    pub slug: String,
    pub mount_point: String,
    pub format: StreamFormat,
    pub source_user: String,
    pub source_password: String,
}

pub struct StationsService;

impl StationsService {
    pub async fn create(db: &DatabaseConnection, station: NewStation) -> Result<stations::Model> {
        let model = stations::ActiveModel {
            id: Set(Uuid::new_v4()),
            mosque_id: Set(station.mosque_id),
            name: Set(station.name),
            slug: Set(station.slug),
            mount_point: Set(station.mount_point),
            format: Set(station.format.to_string()),
            is_live: Set(false),
            current_track_title: Set(None),
            current_track_artist: Set(None),
            current_track_started_at: Set(None),
            source_user: Set(station.source_user),
            source_password: Set(station.source_password),
            listeners: Set(0),
            peak_listeners: Set(0),
            total_listeners: Set(0),
            created_at: Set(now()),
            updated_at: Set(now()),
        };
        Ok(model.insert(db).await?)
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<Option<stations::Model>> {
        Ok(Stations::find_by_id(id).one(db).await?)
    }

    pub async fn find_by_mount(
        db: &DatabaseConnection,
        mount: &str,
    ) -> Result<Option<stations::Model>> {
        let station = Stations::find()
            .filter(stations::Column::MountPoint.eq(mount))
            .one(db)
            .await?;
        Ok(station)
    }

    /// Station format as a recorder codec hint, unknown values fall back to mp3
    pub fn format(station: &stations::Model) -> StreamFormat {
        station.format.parse().unwrap_or_default()
    }

    /// Source credentials are compared as given, an empty stored user never matches
    pub fn verify_source(station: &stations::Model, user: &str, pass: &str) -> bool {
        !station.source_user.is_empty()
            && station.source_user == user
            && station.source_password == pass
    }

    pub async fn mark_live(
        db: &DatabaseConnection,
        station: stations::Model,
    ) -> Result<stations::Model> {
        let mut active: stations::ActiveModel = station.into();
        active.is_live = Set(true);
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    /// Marks the station live with a now-playing entry for the show
    pub async fn set_live(
        db: &DatabaseConnection,
        station: stations::Model,
        title: &str,
        artist: Option<String>,
    ) -> Result<stations::Model> {
        let mut active: stations::ActiveModel = station.into();
        active.is_live = Set(true);
        active.current_track_title = Set(Some(title.to_string()));
        active.current_track_artist = Set(artist);
        active.current_track_started_at = Set(Some(now()));
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn set_offline(
        db: &DatabaseConnection,
        station: stations::Model,
    ) -> Result<stations::Model> {
        let mut active: stations::ActiveModel = station.into();
        active.is_live = Set(false);
        active.current_track_title = Set(None);
        active.current_track_artist = Set(None);
        active.current_track_started_at = Set(None);
        active.listeners = Set(0);
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn listener_joined(
        db: &DatabaseConnection,
        station: stations::Model,
    ) -> Result<stations::Model> {
        let listeners = station.listeners + 1;
        let peak = station.peak_listeners.max(listeners);
        let total = station.total_listeners + 1;
        debug!(station = %station.id, listeners, "listener joined");

        let mut active: stations::ActiveModel = station.into();
        active.listeners = Set(listeners);
        active.peak_listeners = Set(peak);
        active.total_listeners = Set(total);
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn listener_left(
        db: &DatabaseConnection,
        station: stations::Model,
    ) -> Result<stations::Model> {
        let listeners = (station.listeners - 1).max(0);
        debug!(station = %station.id, listeners, "listener left");

        let mut active: stations::ActiveModel = station.into();
        active.listeners = Set(listeners);
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }
}
