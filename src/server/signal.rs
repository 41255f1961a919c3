// Signal handling module
//
// - SIGTERM: stop accepting connections
// - SIGINT:  stop accepting connections (Ctrl+C)

/// Resolve when the process is asked to stop, returning the signal name
#[cfg(unix)]
pub async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            crate::logger::log_warning(&format!("Failed to register SIGTERM handler: {e}"));
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        name = ctrl_c() => name,
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        crate::logger::log_warning(&format!("Failed to listen for Ctrl+C: {e}"));
        // Without a handler the process only stops when killed
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
