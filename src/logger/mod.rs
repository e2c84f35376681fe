//! Logger module
//!
//! Provides logging utilities for the upload service including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Upload diagnostics and error logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use serde::Serialize;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        Level::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level <= Level::Warn => eprintln!("{message}"),
        None => println!("{message}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write(Level::Info, "======================================");
    write(Level::Info, "Upload validator started successfully");
    write(Level::Info, &format!("Listening on: http://{addr}"));
    write(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write(Level::Info, &format!("Worker threads: {workers}"));
    }
    write(
        Level::Info,
        &format!("Max body size: {} bytes", config.http.max_body_size),
    );
    if let Some(max_conn) = config.performance.max_connections {
        write(Level::Info, &format!("Max connections: {max_conn}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write(Level::Info, &format!("Error log: {path}"));
    }
    write(Level::Info, "======================================\n");
}

pub fn log_server_draining(active_connections: usize) {
    write(
        Level::Info,
        &format!("[Shutdown] Listener closed, draining {active_connections} connection(s)"),
    );
}

/// Final shutdown line; `remaining` connections are aborted
pub fn log_server_stopped(remaining: usize) {
    if remaining == 0 {
        write(Level::Info, "[Shutdown] All connections drained");
    } else {
        write(
            Level::Warn,
            &format!("[Shutdown] Drain timed out, aborting {remaining} connection(s)"),
        );
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_info(message: &str) {
    write(Level::Info, &format!("[INFO] {message}"));
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

/// Diagnostic record emitted for each accepted upload
#[derive(Debug, Serialize)]
pub struct UploadRecord<'a> {
    pub name: &'a str,
    pub size: u64,
    #[serde(rename = "type")]
    pub declared_type: &'a str,
    pub timestamp: &'a str,
}

pub fn log_upload(record: &UploadRecord<'_>) {
    match serde_json::to_string(record) {
        Ok(json) => write(Level::Info, &format!("[Upload] {json}")),
        Err(e) => log_error(&format!("Failed to serialize upload record: {e}")),
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
