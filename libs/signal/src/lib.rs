//! Stop signal for the service binaries

use tracing::warn;

#[cfg(unix)]
async fn wait_for_signal_impl() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut terminate, mut interrupt) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(t), Ok(i)) => (t, i),
            (Err(e), _) | (_, Err(e)) => {
                warn!("[signal] cannot install handlers, falling back to ctrl-c: {e}");
                return ctrl_c().await;
            }
        };

    tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal_impl() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "CTRL_C",
        Err(e) => {
            warn!("[signal] ctrl-c listener failed: {e}");
            std::future::pending::<&'static str>().await
        }
    }
}

/// Resolves with the signal name once SIGTERM or SIGINT arrives.
pub async fn wait_for_stop_signal() -> &'static str {
    wait_for_signal_impl().await
}
