//! Topic-scoped notification API
//!
//! ## Routes
//!
//! - `OPTIONS /api/topics/{slug}` - CORS preflight
//! - `POST /api/topics/{slug}` - Route an alert to a topic and store it
//! - `GET /api/topics/{slug}` - Recent notifications for a topic
//!
//! Every response carries the CORS header set; browsers post to these
//! endpoints directly from monitoring dashboards.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::delivery::{ingest_topic, AlertPayload};
use crate::routes::{json_response, method_not_allowed, with_cors};
use crate::server::AppState;
use crate::topics::kind_from_slug;
use crate::types::HeraldError;

/// Notifications returned per topic read
const TOPIC_READ_LIMIT: i64 = 50;

/// Extract the topic slug from the trailing path segment
fn slug_from_path(path: &str) -> Option<&str> {
    let slug = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if slug.is_empty() || slug == "topics" {
        None
    } else {
        Some(slug)
    }
}

/// Handle any request under `/api/topics/{slug}`
pub async fn handle_topic_request(
    state: Arc<AppState>,
    method: Method,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let Some(slug) = slug_from_path(path) else {
        return json_response(
            StatusCode::NOT_FOUND,
            json!({ "error": "Not Found", "path": path }),
        );
    };

    debug!(slug = slug, method = %method, "topic endpoint called");

    match method {
        Method::OPTIONS => preflight(),
        Method::POST => post_notification(state, slug, path, body).await,
        Method::GET => get_notifications(state, slug).await,
        _ => method_not_allowed(),
    }
}

/// CORS preflight: 200, empty body, header set only
fn preflight() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::OK))
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// POST: validate, resolve the topic, store one notification
async fn post_notification(
    state: Arc<AppState>,
    slug: &str,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let payload: AlertPayload = if body.is_empty() {
        AlertPayload::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(p) => p,
            Err(e) => {
                return json_response(
                    StatusCode::BAD_REQUEST,
                    json!({ "error": format!("Invalid JSON: {}", e) }),
                );
            }
        }
    };

    if payload.validate().is_err() {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Missing required fields: title and message are required",
                "received": { "title": payload.title, "message": payload.message },
            }),
        );
    }

    match ingest_topic(&state.store, &state.resolver, &state.feed, slug, path, payload).await {
        Ok(delivered) => json_response(
            StatusCode::OK,
            json!({
                "success": true,
                "message": format!("Notification received for topic: {}", delivered.topic_label),
                "notification": delivered.notification,
                "topic": delivered.topic_label,
            }),
        ),
        Err(HeraldError::Resolution(details)) => {
            warn!(slug = slug, "topic lookup failed: {}", details);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to lookup topic", "details": details }),
            )
        }
        Err(HeraldError::Store(details)) => {
            warn!(slug = slug, "notification insert failed: {}", details);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to store notification", "details": details }),
            )
        }
        Err(e) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal server error", "details": e.to_string() }),
        ),
    }
}

/// GET: the most recent notifications whose type matches the slug
async fn get_notifications(state: Arc<AppState>, slug: &str) -> Response<Full<Bytes>> {
    let kind = kind_from_slug(slug);

    match state.store.notifications_by_type(&kind, TOPIC_READ_LIMIT).await {
        Ok(docs) => {
            let notifications: Vec<_> = docs.iter().map(|d| d.to_record()).collect();
            json_response(
                StatusCode::OK,
                json!({
                    "success": true,
                    "topic": slug,
                    "notifications": notifications,
                }),
            )
        }
        Err(e) => {
            warn!(slug = slug, "topic read failed: {}", e);
            let details = match e {
                HeraldError::Store(details) => details,
                other => other.to_string(),
            };
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch topic notifications", "details": details }),
            )
        }
    }
}
