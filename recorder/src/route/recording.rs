use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use api::recorder::{
    SessionStatus, SessionsStatusResponse, StartRecordingRequest, StartRecordingResponse,
};
use api::response::{Ack, Health};

use crate::error::AppError;
use crate::result::Result;
use crate::route::AppState;
use crate::supervisor::StartError;

/// Routes behind the API key
pub fn route() -> Router<AppState> {
    Router::new()
        .route(api::path::START, post(start))
        .route(&api::path::stop("{recording_id}"), post(stop))
        .route(api::path::STATUS, get(list_status))
        .route(&api::path::status("{recording_id}"), get(status))
}

pub fn health_route() -> Router<AppState> {
    Router::new().route(api::path::HEALTH, get(health))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        service: "minaret-recorder".to_string(),
    })
}

async fn start(
    State(state): State<AppState>,
    body: std::result::Result<Json<StartRecordingRequest>, JsonRejection>,
) -> Result<Json<StartRecordingResponse>> {
    let Json(req) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    req.validate().map_err(AppError::bad_request)?;

    let session = state.supervisor.start(&req).await.map_err(start_error)?;

    Ok(Json(StartRecordingResponse {
        status: "ok".to_string(),
        message: "Recording started".to_string(),
        recording_id: session.recording_id.clone(),
    }))
}

fn start_error(err: StartError) -> AppError {
    match err {
        StartError::InvalidRecordingId(_) | StartError::InvalidMosqueId(_) => {
            AppError::bad_request(err)
        }
        StartError::AlreadyRecording(_) => AppError::recording_already_exists(err),
        StartError::Io(_) | StartError::Spawn(_) => AppError::throw(err),
    }
}

async fn stop(
    State(state): State<AppState>,
    Path(recording_id): Path<String>,
) -> Result<Json<Ack>> {
    if state.supervisor.stop(&recording_id).await {
        Ok(Json(Ack::ok("Recording stop initiated")))
    } else {
        Err(AppError::recording_not_found(
            "Recording not found or already stopped",
        ))
    }
}

async fn status(
    State(state): State<AppState>,
    Path(recording_id): Path<String>,
) -> Result<Json<SessionStatus>> {
    match state.supervisor.registry().get(&recording_id).await {
        Some(session) => Ok(Json(session.status())),
        None => Err(AppError::recording_not_found("Recording not found")),
    }
}

async fn list_status(State(state): State<AppState>) -> Json<SessionsStatusResponse> {
    Json(SessionsStatusResponse {
        sessions: state.supervisor.registry().list_status().await,
    })
}
