//! HTTP response building module
//!
//! JSON builders for every status the service answers with.

use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::HttpConfig;
use crate::error::{StoreError, ValidationError};
use crate::geocode::Boundary;
use crate::logger;

/// Allowed methods advertised by 405 and OPTIONS responses
pub const ALLOW: &str = "GET, HEAD, OPTIONS";

/// Error body: `{"error": <kind>, "message": <text>}`
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthBody<'a> {
    status: &'a str,
}

#[derive(Debug, Serialize)]
struct ReverseBody<'a> {
    geometries: &'a [Boundary],
}

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// 200 `{"status":"ok"}`
pub fn build_health_response() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &HealthBody { status: "ok" })
}

/// 200 `{"geometries":[...]}`
pub fn build_geometries_response(geometries: &[Boundary]) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &ReverseBody { geometries })
}

/// 400 for rejected parameters
pub fn build_validation_error(err: &ValidationError) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &ErrorBody {
            error: err.kind(),
            message: err.to_string(),
        },
    )
}

/// 500 for engine failures, carrying the engine's message
pub fn build_query_error(err: &StoreError) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorBody {
            error: "Database query failed",
            message: err.to_string(),
        },
    )
}

/// 404 Not Found response
pub fn build_404_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorBody {
            error: "Not Found",
            message: format!("No route for '{path}'"),
        },
    )
}

/// 405 Method Not Allowed response
pub fn build_405_response(method: &hyper::Method) -> Response<Full<Bytes>> {
    let mut resp = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorBody {
            error: "Method not allowed",
            message: format!("{method} is not supported"),
        },
    );
    resp.headers_mut()
        .insert("Allow", HeaderValue::from_static(ALLOW));
    resp
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(204).header("Allow", ALLOW);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", ALLOW)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Add the headers every response carries
pub fn apply_common_headers(resp: &mut Response<Full<Bytes>>, http: &HttpConfig) {
    match HeaderValue::from_str(&http.server_name) {
        Ok(v) => {
            resp.headers_mut().insert(SERVER, v);
        }
        Err(e) => logger::log_warning(&format!(
            "Invalid server_name '{}': {e}",
            http.server_name
        )),
    }
    if http.enable_cors {
        resp.headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}

/// Drop the body of a HEAD response, keeping its headers and length
pub fn strip_body(resp: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (mut parts, body) = resp.into_parts();
    if let Some(len) = body.size_hint().exact() {
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
