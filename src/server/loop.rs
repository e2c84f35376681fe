// Server loop module
// Accepts connections until a shutdown is signalled, then drains them

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run the accept loop until `shutdown` is notified
///
/// The listener is closed first, then open connections are asked to finish
/// their current request and given up to `max(read_timeout, write_timeout)`
/// to do so. Must run inside the `LocalSet` that owns the connection tasks,
/// otherwise they are not polled while draining.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    state.begin_shutdown();
    logger::log_server_draining(state.connection_count());

    let remaining = drain_connections(&state, state.config.performance.connection_timeout()).await;
    logger::log_server_stopped(remaining);
}

/// Wait for every connection slot to be released, at most `timeout`
///
/// Returns how many connections were still open at the deadline.
pub async fn drain_connections(state: &AppState, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;

    loop {
        let active = state.connection_count();
        if active == 0 {
            return 0;
        }

        tokio::select! {
            () = tokio::time::sleep(DRAIN_POLL_INTERVAL) => {}
            () = tokio::time::sleep_until(deadline) => return state.connection_count(),
        }
    }
}
