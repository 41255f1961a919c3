//! Reverse geocoding core
//!
//! Request validation, the column whitelist, SQL construction and the
//! DuckDB-backed boundary store.

pub mod columns;
pub mod query;
pub mod request;
pub mod store;

pub use columns::ColumnWhitelist;
pub use request::{Projection, ReverseParams, ReverseRequest};
pub use store::{Boundary, BoundaryStore, DuckDbStore};
