//! Request handler module
//!
//! Responsible for request routing dispatch and the reverse geocode endpoint.

pub mod reverse;
pub mod router;

// Re-export main entry point
pub use router::{handle_request, route};
