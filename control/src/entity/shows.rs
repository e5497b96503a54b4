use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "shows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub station_id: Uuid,
    pub mosque_id: String,
    pub title: String,
    pub host_name: Option<String>,
    pub scheduled_start: DateTimeWithTimeZone,
    pub scheduled_end: DateTimeWithTimeZone,
    pub is_live: bool,
    pub actual_start: Option<DateTimeWithTimeZone>,
    pub actual_end: Option<DateTimeWithTimeZone>,
    pub recording_enabled: bool,
    pub recording_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
