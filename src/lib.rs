//! HTTP upload validation service
//!
//! Accepts a `multipart/form-data` POST, checks the `file` field against size
//! and type constraints, and answers with a JSON result.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod upload;
