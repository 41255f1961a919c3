//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{REFERER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::reverse;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let response = route(req.method(), req.uri().path(), req.uri().query(), &state).await;

    if state.config.logging.access_log {
        let entry = access_entry(&req, &response, peer_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route a request to its endpoint and apply the common response headers
pub async fn route(
    method: &Method,
    path: &str,
    query: Option<&str>,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let mut response = match check_http_method(method, state.config.http.enable_cors) {
        Some(resp) => resp,
        None => dispatch(path, query, state).await,
    };

    http::apply_common_headers(&mut response, &state.config.http);

    if *method == Method::HEAD {
        http::strip_body(response)
    } else {
        response
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response(method))
        }
    }
}

async fn dispatch(path: &str, query: Option<&str>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let routes = &state.config.routes;
    let matched = trim_trailing_slash(path);

    // Liveness never touches the engine
    if matched == routes.health_path {
        return http::build_health_response();
    }

    if matched == routes.reverse_path {
        return reverse::handle_reverse(query, state).await;
    }

    http::build_404_response(path)
}

/// Drop one trailing `/` so `/reverse/` routes like `/reverse`; `/` stays as is
fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

fn access_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: hyper::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0".to_string(),
        hyper::Version::HTTP_2 => "2".to_string(),
        _ => "1.1".to_string(),
    };
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EnvOverrides};
    use crate::error::StoreError;
    use crate::geocode::{Boundary, BoundaryStore, ColumnWhitelist, Projection, ReverseRequest};
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store: a record matches when the point lies strictly inside its bbox
    struct FakeStore {
        records: Vec<Boundary>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeStore {
        fn andorra() -> Self {
            let records = [
                json!({
                    "id": 85632163, "name": "Andorra", "placetype": "country",
                    "geometry": "POLYGON ((1.4 42.4, 1.8 42.4, 1.8 42.7, 1.4 42.7, 1.4 42.4))",
                    "geometry_bbox": {"xmin": 1.4, "xmax": 1.8, "ymin": 42.4, "ymax": 42.7}
                }),
                json!({
                    "id": 404227619, "name": "Andorra la Vella", "placetype": "locality",
                    "geometry": "POLYGON ((1.50 42.49, 1.54 42.49, 1.54 42.52, 1.50 42.52, 1.50 42.49))",
                    "geometry_bbox": {"xmin": 1.50, "xmax": 1.54, "ymin": 42.49, "ymax": 42.52}
                }),
            ];
            Self {
                records: records
                    .into_iter()
                    .map(|v| v.as_object().cloned().unwrap())
                    .collect(),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::andorra()
            }
        }

        fn contains(record: &Boundary, lon: f64, lat: f64) -> bool {
            let bbox = &record["geometry_bbox"];
            let get = |k: &str| bbox[k].as_f64().unwrap();
            get("xmin") < lon && lon < get("xmax") && get("ymin") < lat && lat < get("ymax")
        }

        fn project(record: &Boundary, projection: &Projection) -> Boundary {
            match projection {
                Projection::All => record.clone(),
                Projection::AllExceptGeometry => {
                    let mut out = record.clone();
                    out.remove("geometry");
                    out
                }
                Projection::Columns(cols) => cols
                    .iter()
                    .map(|c| (c.clone(), record[c].clone()))
                    .collect(),
            }
        }
    }

    impl BoundaryStore for FakeStore {
        fn lookup(&self, request: &ReverseRequest) -> Result<Vec<Boundary>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                let err = duckdb::Connection::open_in_memory()
                    .and_then(|c| c.execute_batch("SELECT * FROM missing_table"))
                    .unwrap_err();
                return Err(StoreError::Engine(err));
            }
            Ok(self
                .records
                .iter()
                .filter(|r| Self::contains(r, request.lon, request.lat))
                .map(|r| Self::project(r, &request.projection))
                .collect())
        }
    }

    fn state_with(store: Arc<FakeStore>) -> Arc<AppState> {
        let config = Config::load_from("does-not-exist/config", &EnvOverrides::default()).unwrap();
        let columns = ColumnWhitelist::new(["id", "name", "placetype", "geometry", "geometry_bbox"]);
        Arc::new(AppState::new(config, columns, store))
    }

    async fn get(state: &Arc<AppState>, path_and_query: &str) -> (StatusCode, Value) {
        let (path, query) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path_and_query, None),
        };
        let resp = route(&Method::GET, path, query, state).await;
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_is_independent_of_store() {
        let store = Arc::new(FakeStore::failing());
        let state = state_with(Arc::clone(&store));
        let (status, body) = get(&state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reverse_default_excludes_geometry() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (status, body) = get(&state, "/reverse?lon=1.5218&lat=42.5063").await;
        assert_eq!(status, StatusCode::OK);
        let geometries = body["geometries"].as_array().unwrap();
        assert_eq!(geometries.len(), 2);
        for g in geometries {
            assert!(!g["name"].as_str().unwrap().is_empty());
            assert!(g.get("geometry").is_none());
        }
    }

    #[tokio::test]
    async fn test_reverse_specific_fields() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (status, body) =
            get(&state, "/reverse?lon=1.5218&lat=42.5063&fields=id,name,placetype").await;
        assert_eq!(status, StatusCode::OK);
        let first = body["geometries"][0].as_object().unwrap();
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "name", "placetype"]);
    }

    #[tokio::test]
    async fn test_reverse_star_includes_geometry() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (status, body) = get(&state, "/reverse?lon=1.5218&lat=42.5063&fields=*").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["geometries"][0]["geometry"].is_string());
    }

    #[tokio::test]
    async fn test_reverse_no_match_is_empty_list() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (status, body) = get(&state, "/reverse?lon=-122.4194&lat=37.7749").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"geometries": []}));
    }

    #[tokio::test]
    async fn test_validation_errors_skip_the_store() {
        let store = Arc::new(FakeStore::andorra());
        let state = state_with(Arc::clone(&store));

        let cases = [
            ("/reverse?lon=200&lat=37.7749", "Invalid coordinate"),
            ("/reverse?lon=1&lat=-91", "Invalid coordinate"),
            ("/reverse?lon=-122.4194", "Missing required parameter"),
            ("/reverse?lat=37.7749", "Missing required parameter"),
            ("/reverse", "Missing required parameter"),
            ("/reverse?lon=abc&lat=37.7749", "Invalid parameter"),
            (
                "/reverse?lon=-122.4194&lat=37.7749&fields=invalid_field_xyz",
                "Invalid field name",
            ),
        ];
        for (uri, kind) in cases {
            let (status, body) = get(&state, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], kind, "{uri}");
            assert!(!body["message"].as_str().unwrap().is_empty());
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_field_message_names_the_field() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (_, body) = get(&state, "/reverse?lon=1&lat=2&fields=id,name%3B%20DROP").await;
        assert_eq!(
            body["message"],
            "Field 'name; DROP' does not exist in the data source."
        );
    }

    #[tokio::test]
    async fn test_engine_failure_is_500() {
        let state = state_with(Arc::new(FakeStore::failing()));
        let (status, body) = get(&state, "/reverse?lon=1.5218&lat=42.5063").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database query failed");
        assert!(!body["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let first = get(&state, "/reverse?lon=1.5218&lat=42.5063&fields=id,name").await;
        let second = get(&state, "/reverse?lon=1.5218&lat=42.5063&fields=id,name").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (status, body) = get(&state, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");

        let resp = route(&Method::POST, "/reverse", None, &state).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
    }

    #[tokio::test]
    async fn test_trailing_slash_routes_to_same_endpoint() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let (status, body) = get(&state, "/health/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));

        let plain = get(&state, "/reverse?lon=1.5218&lat=42.5063").await;
        let slashed = get(&state, "/reverse/?lon=1.5218&lat=42.5063").await;
        assert_eq!(plain, slashed);

        // only one slash is forgiven
        let (status, _) = get(&state, "/reverse//?lon=1.5218&lat=42.5063").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(trim_trailing_slash("/reverse/"), "/reverse");
        assert_eq!(trim_trailing_slash("/reverse"), "/reverse");
        assert_eq!(trim_trailing_slash("/"), "/");
    }

    #[tokio::test]
    async fn test_head_keeps_headers_without_body() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let resp = route(&Method::HEAD, "/health", None, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "15");
        assert_eq!(resp.headers()["server"], "wof-reverse");
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let state = state_with(Arc::new(FakeStore::andorra()));
        let resp = route(&Method::OPTIONS, "/reverse", None, &state).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
