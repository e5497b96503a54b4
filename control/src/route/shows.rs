use axum::extract::{Path, Query, State};
use axum::routing::post;
use axum::{Json, Router};

use api::request::TenantQuery;
use api::response::ShowState;

use crate::entity::{shows, stations};
use crate::error::AppError;
use crate::result::Result;
use crate::route::{AppState, parse_id};
use crate::service::{ShowsService, StationsService};

/// Operator show lifecycle, behind the API key
pub fn route() -> Router<AppState> {
    Router::new()
        .route(&api::path::show_start("{id}"), post(start))
        .route(&api::path::show_end("{id}"), post(end))
}

async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(tenant): Query<TenantQuery>,
) -> Result<Json<ShowState>> {
    let (show, station) = load(&state, &id, &tenant, "start").await?;
    if show.is_live {
        return Err(AppError::bad_request("Show is already live"));
    }
    let show = state.live.show_started(show, station).await?;
    Ok(Json(show_state(&show)))
}

async fn end(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(tenant): Query<TenantQuery>,
) -> Result<Json<ShowState>> {
    let (show, station) = load(&state, &id, &tenant, "end").await?;
    if !show.is_live {
        return Err(AppError::bad_request("Show is not live"));
    }
    let show = state.live.show_ended(show, station).await?;
    Ok(Json(show_state(&show)))
}

async fn load(
    state: &AppState,
    id: &str,
    tenant: &TenantQuery,
    action: &str,
) -> Result<(shows::Model, stations::Model)> {
    let id = parse_id(id, "show")?;
    let show = ShowsService::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Show not found"))?;

    if show.mosque_id != tenant.mosque_id {
        return Err(AppError::forbidden(format!("You can only {action} your own shows")));
    }

    let station = StationsService::get(&state.db, show.station_id)
        .await?
        .ok_or_else(|| AppError::not_found("Station not found"))?;
    Ok((show, station))
}

fn show_state(show: &shows::Model) -> ShowState {
    ShowState {
        show_id: show.id.to_string(),
        station_id: show.station_id.to_string(),
        is_live: show.is_live,
        recording_id: show.recording_id.map(|id| id.to_string()),
    }
}
