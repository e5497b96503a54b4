use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mosque_id: String,
    pub name: String,
    pub slug: String,
    #[sea_orm(unique)]
    pub mount_point: String,
    pub format: String, // mp3, ogg, aac
    pub is_live: bool,
    pub current_track_title: Option<String>,
    pub current_track_artist: Option<String>,
    pub current_track_started_at: Option<DateTimeWithTimeZone>,
    pub source_user: String,
    pub source_password: String,
    pub listeners: i32,
    pub peak_listeners: i32,
    pub total_listeners: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
