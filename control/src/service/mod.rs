pub mod database;
pub mod recordings;
pub mod shows;
pub mod stations;

pub use database::DatabaseService;
pub use recordings::RecordingsService;
pub use shows::ShowsService;
pub use stations::StationsService;

pub(crate) fn now() -> chrono::DateTime<chrono::FixedOffset> {
    chrono::DateTime::<chrono::FixedOffset>::from(chrono::Utc::now())
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{Duration, Utc};
    use sea_orm::DatabaseConnection;

    use api::recorder::StreamFormat;

    use crate::config::Database;
    use crate::entity::{shows, stations};
    use crate::service::shows::NewShow;
    use crate::service::stations::NewStation;
    use crate::service::{DatabaseService, ShowsService, StationsService};

    pub async fn memory_db() -> DatabaseConnection {
        let cfg = Database {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout: 5,
        };
        DatabaseService::new(&cfg).await.unwrap().connection
    }

    pub async fn station(db: &DatabaseConnection, mount: &str) -> stations::Model {
        StationsService::create(
            db,
            NewStation {
                mosque_id: "mosque-1".to_string(),
                name: "Masjid Radio".to_string(),
                slug: mount.trim_start_matches('/').to_string(),
                mount_point: mount.to_string(),
                format: StreamFormat::Mp3,
                source_user: "source".to_string(),
                source_password: "hackme".to_string(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn show(
        db: &DatabaseConnection,
        station: &stations::Model,
        title: &str,
    ) -> shows::Model {
        let start = Utc::now() + Duration::minutes(5);
        ShowsService::create(
            db,
            NewShow {
                station_id: station.id,
                mosque_id: station.mosque_id.clone(),
                title: title.to_string(),
                host_name: Some("Sheikh Ahmad".to_string()),
                scheduled_start: start,
                scheduled_end: start + Duration::hours(1),
                recording_enabled: true,
            },
        )
        .await
        .unwrap()
    }
}
