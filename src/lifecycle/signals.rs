//! OS signal handling.
//!
//! # Responsibilities
//! - Translate Ctrl+C / SIGTERM into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The listener exits quietly when shutdown is triggered some other way

use crate::lifecycle::Shutdown;

/// Trigger `shutdown` on the first interrupt or terminate signal.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    tokio::select! {
        signal = wait_for_signal() => {
            match signal {
                Ok(name) => tracing::info!(signal = name, "Shutdown signal received"),
                Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signals"),
            }
            shutdown.trigger();
        }
        _ = shutdown.wait() => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn returns_when_shutdown_triggered_elsewhere() {
        let shutdown = Shutdown::new();
        let listener = tokio::spawn(shutdown_on_signal(shutdown.clone()));
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), listener)
            .await
            .unwrap()
            .unwrap();
    }
}
