//! Reverse geocoding service over a Who's On First administrative GeoParquet file.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as a
//! library so the router can be driven directly from tests.

pub mod config;
pub mod dataset;
pub mod error;
pub mod geocode;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
