use std::future::Future;
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_http::validate_request::ValidateRequestHeaderLayer;
use tracing::{error, info, info_span};

use auth::ApiKeyValidate;

use crate::config::Config;
use crate::live::LiveCoordinator;
use crate::orchestrator::Orchestrator;
use crate::reconciler::Reconciler;
use crate::recorder_client::RecorderClient;
use crate::route::{AppState, icecast, recordings, shows};
use crate::service::DatabaseService;

pub mod config;
pub mod entity;
pub mod live;
pub mod migration;
pub mod orchestrator;
pub mod reconciler;
pub mod recorder_client;
pub mod service;

mod error;
mod result;
mod route;

pub async fn serve<F>(cfg: Config, listener: TcpListener, signal: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let database = DatabaseService::new(&cfg.database).await?;
    serve_with(cfg, database, listener, signal).await
}

/// Serves on an already connected and migrated database
pub async fn serve_with<F>(
    cfg: Config,
    database: DatabaseService,
    listener: TcpListener,
    signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Server listening on {}", listener.local_addr()?);

    let db = database.connection;
    let recorder = RecorderClient::new(
        &cfg.recorder.url,
        &cfg.recorder.api_key,
        Duration::from_millis(cfg.recorder.timeout_ms),
    )?;
    let orchestrator = Orchestrator::new(db.clone(), recorder, cfg.clone());
    let live = LiveCoordinator::new(db.clone(), orchestrator.clone());
    let reconciler = Reconciler::new(db.clone(), live.clone(), cfg.recording.clone());

    let app_state = AppState {
        config: cfg.clone(),
        db,
        orchestrator,
        live,
        reconciler,
    };

    let auth_layer = ValidateRequestHeaderLayer::custom(ApiKeyValidate::new(
        app_state.config.api.api_keys.clone(),
    ));
    let app = Router::new()
        .merge(
            recordings::route()
                .merge(shows::route())
                .layer(auth_layer),
        )
        .merge(recordings::public_route())
        .merge(icecast::route())
        .with_state(app_state)
        .layer(if cfg.http.cors {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        })
        .layer(axum::middleware::from_fn(http_log::print_request_response))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let span = info_span!(
                    "http_request",
                    uri = ?request.uri(),
                    method = ?request.method(),
                    span_id = tracing::field::Empty,
                );
                span.record(
                    "span_id",
                    span.id().unwrap_or(tracing::Id::from_u64(42)).into_u64(),
                );
                span
            }),
        );

    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
        .unwrap_or_else(|e| error!("Application error: {e}"));
    Ok(())
}
