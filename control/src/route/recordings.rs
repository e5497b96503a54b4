use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tracing::info;

use api::recorder::RecordingCallback;
use api::recording::{Playback, Recording, RecordingList, RecordingStatus};
use api::request::{PublicRecordingsQuery, RecordingsQuery, TenantQuery};
use api::response::Ack;

use crate::error::AppError;
use crate::orchestrator::CallbackOutcome;
use crate::result::Result;
use crate::route::{AppState, parse_id};
use crate::service::RecordingsService;

/// Routes behind the API key
pub fn route() -> Router<AppState> {
    Router::new()
        .route(api::path::RECORDINGS_CALLBACK, post(callback))
        .route(api::path::RECORDINGS, get(list))
        .route(&api::path::recording("{id}"), delete(remove))
}

pub fn public_route() -> Router<AppState> {
    Router::new()
        .route(api::path::RECORDINGS_PUBLIC, get(list_public))
        .route(&api::path::recording("{id}"), get(show))
        .route(&api::path::recording_playback("{id}"), get(playback))
        .route(&api::path::recording_by_show("{show_id}"), get(by_show))
}

async fn callback(
    State(state): State<AppState>,
    body: std::result::Result<Json<RecordingCallback>, JsonRejection>,
) -> Result<Json<Ack>> {
    let Json(callback) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    info!(
        "[callback] recording {} status {:?} chunk {:?}",
        callback.recording_id,
        callback.status,
        callback.chunk.as_ref().map(|c| c.index)
    );

    match state.orchestrator.on_callback(callback).await? {
        CallbackOutcome::NotFound => Err(AppError::not_found("Recording not found")),
        CallbackOutcome::Discarded => Ok(Json(Ack::ok("Recording discarded (too short)"))),
        CallbackOutcome::Updated(_) => Ok(Json(Ack::ok("Callback received"))),
    }
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<RecordingsQuery>,
) -> Result<Json<RecordingList>> {
    let (recordings, total) = RecordingsService::list(&state.db, &params).await?;
    Ok(Json(RecordingList {
        results: recordings.len(),
        total,
        recordings,
    }))
}

async fn list_public(
    State(state): State<AppState>,
    Query(params): Query<PublicRecordingsQuery>,
) -> Result<Json<RecordingList>> {
    if let Some(station_id) = &params.station_id {
        parse_id(station_id, "station")?;
    }
    let (recordings, total) = RecordingsService::list_public(&state.db, &params).await?;
    Ok(Json(RecordingList {
        results: recordings.len(),
        total,
        recordings,
    }))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Recording>> {
    let id = parse_id(&id, "recording")?;
    match RecordingsService::load(&state.db, id).await? {
        Some(recording) => Ok(Json(recording)),
        None => Err(AppError::not_found("Recording not found")),
    }
}

async fn playback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Playback>> {
    let id = parse_id(&id, "recording")?;
    let recording = RecordingsService::load(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recording not found"))?;

    if recording.status != RecordingStatus::Ready {
        return Err(AppError::bad_request(format!(
            "Recording is not ready. Current status: {}",
            recording.status
        )));
    }

    Ok(Json(Playback::from(&recording)))
}

async fn by_show(
    State(state): State<AppState>,
    Path(show_id): Path<String>,
) -> Result<Json<Recording>> {
    let show_id = parse_id(&show_id, "show")?;
    match RecordingsService::find_ready_for_show(&state.db, show_id).await? {
        Some(recording) => Ok(Json(recording)),
        None => Err(AppError::not_found("No recording found for this show")),
    }
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(tenant): Query<TenantQuery>,
) -> Result<Json<Ack>> {
    let id = parse_id(&id, "recording")?;
    let recording = RecordingsService::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recording not found"))?;

    if recording.mosque_id != tenant.mosque_id {
        return Err(AppError::forbidden("Not authorized to delete this recording"));
    }

    RecordingsService::delete(&state.db, id).await?;
    info!("[recordings] recording {} deleted", id);
    Ok(Json(Ack::ok("Recording deleted")))
}
