//! HTTP protocol layer module
//!
//! Response builders and query string decoding, decoupled from the geocoding
//! logic.

pub mod query;
pub mod response;

// Re-export commonly used types
pub use query::QueryParams;
pub use response::{
    apply_common_headers, build_404_response, build_405_response, build_geometries_response,
    build_health_response, build_options_response, build_query_error, build_validation_error,
    json_response, strip_body,
};
