//! HTTP protocol layer module
//!
//! Response builders shared by the request handler, decoupled from upload logic.

pub mod response;

pub use response::{build_json_response, build_options_response};
