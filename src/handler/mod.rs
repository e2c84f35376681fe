//! Request handler module
//!
//! Responsible for request dispatch and mapping upload outcomes to responses.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
