//! HTTP routes for Herald

pub mod health;
pub mod notifications;
pub mod topics;

pub use health::{health_check, version_info};
pub use notifications::handle_notifications_request;
pub use topics::handle_topic_request;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// CORS header set attached to every API response, preflight included
pub fn with_cors(builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization, X-Requested-With",
        )
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .header("Access-Control-Max-Age", "86400")
}

/// JSON response with the CORS header set
pub fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(status))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from(r#"{"error":"Internal error"}"#)))
                .unwrap()
        })
}

/// 405 for methods outside a route's surface
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        serde_json::json!({ "error": "Method not allowed" }),
    )
}
