//! Reverse geocode endpoint
//!
//! Validates the query parameters, runs the lookup on the blocking pool and
//! shapes the JSON response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::sync::Arc;

use crate::config::AppState;
use crate::error::StoreError;
use crate::geocode::{Boundary, ReverseParams, ReverseRequest};
use crate::http::{self, QueryParams};
use crate::logger;

/// Handle `GET /reverse?lon=..&lat=..&fields=..`
pub async fn handle_reverse(query: Option<&str>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let params = QueryParams::parse(query);
    let raw = ReverseParams {
        lon: params.get("lon"),
        lat: params.get("lat"),
        fields: params.get("fields"),
    };

    let request = match ReverseRequest::parse(&raw, &state.columns) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(kind = err.kind(), "Rejected reverse request: {err}");
            return http::build_validation_error(&err);
        }
    };

    match lookup(request, state).await {
        Ok(geometries) => {
            tracing::debug!("Reverse lookup matched {} boundaries", geometries.len());
            http::build_geometries_response(&geometries)
        }
        Err(err) => {
            logger::log_error(&format!("Query error: {err}"));
            http::build_query_error(&err)
        }
    }
}

async fn lookup(request: ReverseRequest, state: &AppState) -> Result<Vec<Boundary>, StoreError> {
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || store.lookup(&request))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}
