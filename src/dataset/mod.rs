//! Boundary dataset maintenance
//!
//! The service only reads the GeoParquet file; keeping it current is the
//! job of the `fetch-dataset` binary built on this module.

pub mod refresh;

pub use refresh::{check_freshness, DatasetRefresher, Freshness, RefreshOutcome};
