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
use storage::Publisher;

use crate::callback::CallbackClient;
use crate::config::Config;
use crate::processor::SegmentProcessor;
use crate::route::{AppState, recording};
use crate::session::SessionRegistry;
use crate::supervisor::Supervisor;

pub mod callback;
pub mod config;
pub mod processor;
pub mod segment;
pub mod session;
pub mod supervisor;

mod error;
mod result;
mod route;

pub async fn serve<F>(cfg: Config, listener: TcpListener, signal: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Server listening on {}", listener.local_addr()?);

    let operator = storage::init_operator(&cfg.storage).await?;
    let publisher = Publisher::new(operator, cfg.publish.public_url.clone());
    let callbacks = CallbackClient::new(
        &cfg.callback.api_key,
        Duration::from_millis(cfg.callback.timeout_ms),
    )?;
    let processor = SegmentProcessor::new(
        &cfg.capture.ffmpeg,
        &cfg.capture.ffprobe,
        publisher,
        callbacks.clone(),
    );

    tokio::fs::create_dir_all(&cfg.capture.work_dir).await?;
    let supervisor = Supervisor::new(
        SessionRegistry::new(),
        processor,
        callbacks,
        cfg.capture.clone(),
    );

    let app_state = AppState {
        config: cfg.clone(),
        supervisor: supervisor.clone(),
    };

    let auth_layer = ValidateRequestHeaderLayer::custom(ApiKeyValidate::new(
        app_state.config.auth.api_keys.clone(),
    ));
    let app = Router::new()
        .merge(recording::route().layer(auth_layer))
        .merge(recording::health_route())
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

    supervisor
        .shutdown(Duration::from_secs(cfg.capture.stop_timeout_secs + 10))
        .await;
    Ok(())
}
