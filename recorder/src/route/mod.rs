use crate::config::Config;
use crate::supervisor::Supervisor;

pub mod recording;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub supervisor: Supervisor,
}
