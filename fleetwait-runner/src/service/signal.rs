//! Process shutdown signal

use tracing::warn;

/// Completes when the process receives Ctrl-C
///
/// If the signal handler cannot be installed this never completes, so the
/// wait is not abandoned by mistake.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
