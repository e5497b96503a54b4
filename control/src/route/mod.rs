use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::live::LiveCoordinator;
use crate::orchestrator::Orchestrator;
use crate::reconciler::Reconciler;

pub mod icecast;
pub mod recordings;
pub mod shows;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
    pub orchestrator: Orchestrator,
    pub live: LiveCoordinator,
    pub reconciler: Reconciler,
}

pub(crate) fn parse_id(id: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::bad_request(format!("Invalid {what} id")))
}
