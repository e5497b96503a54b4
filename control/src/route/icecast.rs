use axum::Form;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use http::StatusCode;
use tracing::{debug, error, info, warn};

use api::relay::{
    ICECAST_AUTH_MESSAGE, ICECAST_AUTH_USER, ListenerAdd, ListenerAuth, ListenerRemove, MountAdd,
    MountRemove, SourceAuth,
};

use crate::route::AppState;
use crate::service::StationsService;

/// Relay hooks, answered without an API key
pub fn route() -> Router<AppState> {
    Router::new()
        .route(api::path::ICECAST_SOURCE_AUTH, post(source_auth))
        .route(api::path::ICECAST_LISTENER_AUTH, post(listener_auth))
        .route(api::path::ICECAST_MOUNT_ADD, post(mount_add))
        .route(api::path::ICECAST_MOUNT_REMOVE, post(mount_remove))
        .route(api::path::ICECAST_LISTENER_ADD, post(listener_add))
        .route(api::path::ICECAST_LISTENER_REMOVE, post(listener_remove))
}

fn auth_response(status: StatusCode, allowed: bool, message: &str) -> Response {
    let flag = if allowed { "1" } else { "0" };
    (
        status,
        [
            (ICECAST_AUTH_USER, flag),
            (ICECAST_AUTH_MESSAGE, message),
            ("content-type", "text/plain"),
        ],
        format!("{ICECAST_AUTH_USER}: {flag}"),
    )
        .into_response()
}

async fn source_auth(
    State(state): State<AppState>,
    form: Result<Form<SourceAuth>, FormRejection>,
) -> Response {
    let Ok(Form(req)) = form else {
        return auth_response(StatusCode::UNAUTHORIZED, false, "Malformed request");
    };
    info!(
        "[icecast] source connection attempt from {} on {} ({:?})",
        req.user, req.mount, req.ip
    );

    match StationsService::find_by_mount(&state.db, &req.mount).await {
        Ok(Some(station)) => {
            if StationsService::verify_source(&station, &req.user, &req.pass) {
                auth_response(StatusCode::OK, true, "Authentication successful")
            } else {
                warn!("[icecast] source rejected on {}", req.mount);
                auth_response(StatusCode::UNAUTHORIZED, false, "Invalid credentials")
            }
        }
        Ok(None) => auth_response(StatusCode::NOT_FOUND, false, "Unknown mount"),
        Err(err) => {
            error!("[icecast] source auth error: {}", err);
            auth_response(StatusCode::INTERNAL_SERVER_ERROR, false, "Server error")
        }
    }
}

async fn listener_auth(form: Result<Form<ListenerAuth>, FormRejection>) -> Response {
    if let Ok(Form(req)) = form {
        debug!("[icecast] listener auth {:?} from {:?}", req.mount, req.ip);
    }
    auth_response(StatusCode::OK, true, "Access granted")
}

async fn mount_add(
    State(state): State<AppState>,
    form: Result<Form<MountAdd>, FormRejection>,
) -> StatusCode {
    match form {
        Ok(Form(req)) => {
            info!("[icecast] mount added {} ({:?}:{:?})", req.mount, req.server, req.port);
            match state.reconciler.mount_add(&req.mount).await {
                Ok(event) => debug!("[icecast] mount-add {}: {:?}", req.mount, event),
                Err(err) => error!("[icecast] mount-add {} error: {}", req.mount, err),
            }
        }
        Err(err) => warn!("[icecast] malformed mount-add: {}", err),
    }
    StatusCode::OK
}

async fn mount_remove(
    State(state): State<AppState>,
    form: Result<Form<MountRemove>, FormRejection>,
) -> StatusCode {
    match form {
        Ok(Form(req)) => {
            info!("[icecast] mount removed {} ({:?})", req.mount, req.server);
            match state.reconciler.mount_remove(&req.mount).await {
                Ok(event) => debug!("[icecast] mount-remove {}: {:?}", req.mount, event),
                Err(err) => error!("[icecast] mount-remove {} error: {}", req.mount, err),
            }
        }
        Err(err) => warn!("[icecast] malformed mount-remove: {}", err),
    }
    StatusCode::OK
}

async fn listener_add(
    State(state): State<AppState>,
    form: Result<Form<ListenerAdd>, FormRejection>,
) -> StatusCode {
    match form {
        Ok(Form(req)) => {
            debug!("[icecast] listener {:?} joined {}", req.client, req.mount);
            if let Err(err) = state.reconciler.listener_add(&req.mount).await {
                error!("[icecast] listener-add {} error: {}", req.mount, err);
            }
        }
        Err(err) => warn!("[icecast] malformed listener-add: {}", err),
    }
    StatusCode::OK
}

async fn listener_remove(
    State(state): State<AppState>,
    form: Result<Form<ListenerRemove>, FormRejection>,
) -> StatusCode {
    match form {
        Ok(Form(req)) => {
            debug!(
                "[icecast] listener {:?} left {} after {:?}s",
                req.client, req.mount, req.duration
            );
            if let Err(err) = state.reconciler.listener_remove(&req.mount).await {
                error!("[icecast] listener-remove {} error: {}", req.mount, err);
            }
        }
        Err(err) => warn!("[icecast] malformed listener-remove: {}", err),
    }
    StatusCode::OK
}
