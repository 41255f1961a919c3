// Server loop module
// Accepts connections until a shutdown signal arrives

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop.
///
/// Must run inside a `LocalSet`: connections are served with `spawn_local`.
/// Returns once `shutdown` resolves; connections still in flight are
/// dropped with the runtime.
pub async fn run_server_loop<S>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: S,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal);
                return Ok(());
            }
        }
    }
}
