// Application state module
// Read-only configuration shared by every connection

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

use super::types::Config;

/// Application state
///
/// Requests never write to it; the mutable pieces are the connection
/// counter used for `performance.max_connections` and the shutdown flag
/// open connections watch.
pub struct AppState {
    pub config: Config,
    pub active_connections: AtomicUsize,
    stopping: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (stopping, _) = watch::channel(false);
        Self {
            config,
            active_connections: AtomicUsize::new(0),
            stopping,
        }
    }

    /// Tell open connections to finish their current request and close
    pub fn begin_shutdown(&self) {
        self.stopping.send_replace(true);
    }

    /// Receiver that flips to `true` once [`AppState::begin_shutdown`] runs
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.stopping.subscribe()
    }

    /// Reserve a connection slot, returning the previous count on success
    ///
    /// Increments first, then rolls back when over the limit, so concurrent
    /// accepts cannot both slip under it.
    pub fn try_acquire_connection(&self) -> Result<usize, usize> {
        let prev = self.active_connections.fetch_add(1, Ordering::SeqCst);
        if let Some(max_conn) = self.config.performance.max_connections {
            if prev >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                self.active_connections.fetch_sub(1, Ordering::SeqCst);
                return Err(prev);
            }
        }
        Ok(prev)
    }

    pub fn release_connection(&self) {
        self.active_connections.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
