//! Global notifications API
//!
//! ## Routes
//!
//! - `GET /api/notifications` - Recent notifications across all topics
//! - `POST /api/notifications` - Store a notification with an explicit type
//! - `PUT /api/notifications` - Acknowledge one notification or all of them
//!
//! PUT is the primary update path used by acknowledgment trackers; their
//! fallback is a direct store mutation.

use bson::DateTime;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::db::schemas::NotificationDoc;
use crate::delivery::{insert_and_publish, AlertPayload};
use crate::routes::{json_response, method_not_allowed, with_cors};
use crate::server::AppState;
use crate::types::HeraldError;

/// Notifications returned per read
const READ_LIMIT: i64 = 50;

/// Fallback type for notifications posted without one
const DEFAULT_KIND: &str = "notification";

/// POST payload: the alert fields plus an explicit type
#[derive(Debug, Deserialize)]
struct NotifyPayload {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    alert: AlertPayload,
}

/// PUT payload: single-id or bulk acknowledgment
#[derive(Debug, Deserialize)]
struct AckPayload {
    id: Option<String>,
    acknowledged: Option<bool>,
    #[serde(rename = "acknowledgeAll", default)]
    acknowledge_all: bool,
}

/// Handle any request to `/api/notifications`
pub async fn handle_notifications_request(
    state: Arc<AppState>,
    method: Method,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    match method {
        Method::OPTIONS => with_cors(Response::builder().status(StatusCode::OK))
            .body(Full::new(Bytes::new()))
            .unwrap(),
        Method::GET => get_recent(state).await,
        Method::POST => post_notification(state, path, body).await,
        Method::PUT => put_acknowledge(state, body).await,
        _ => method_not_allowed(),
    }
}

async fn get_recent(state: Arc<AppState>) -> Response<Full<Bytes>> {
    match state.store.recent_notifications(READ_LIMIT).await {
        Ok(docs) => {
            let notifications: Vec<_> = docs.iter().map(|d| d.to_record()).collect();
            json_response(
                StatusCode::OK,
                json!({ "success": true, "notifications": notifications }),
            )
        }
        Err(e) => {
            warn!("notification read failed: {}", e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch notifications", "details": e.to_string() }),
            )
        }
    }
}

async fn post_notification(
    state: Arc<AppState>,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let payload: NotifyPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid JSON: {}", e) }),
            );
        }
    };

    let (title, message) = match payload.alert.validate() {
        Ok(fields) => fields,
        Err(_) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Missing required fields: title and message are required",
                    "received": {
                        "title": payload.alert.title,
                        "message": payload.alert.message,
                    },
                }),
            );
        }
    };

    let mut metadata = payload.alert.extra.clone();
    metadata.insert("api_endpoint".into(), path.into());

    let doc = NotificationDoc {
        _id: None,
        title: title.to_string(),
        body: message.to_string(),
        kind: payload
            .kind
            .clone()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KIND.to_string()),
        priority: payload.alert.priority.unwrap_or_default(),
        metadata,
        created_at: DateTime::now(),
        acknowledged: false,
    };

    match insert_and_publish(&state.store, &state.feed, doc).await {
        Ok(record) => json_response(
            StatusCode::OK,
            json!({ "success": true, "notification": record }),
        ),
        Err(HeraldError::Store(details)) => {
            warn!("notification insert failed: {}", details);
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

async fn put_acknowledge(state: Arc<AppState>, body: Bytes) -> Response<Full<Bytes>> {
    let payload: AckPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid JSON: {}", e) }),
            );
        }
    };

    // The transition is monotonic: un-acknowledging is not an operation
    if payload.acknowledged == Some(false) {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "acknowledged can only be set to true" }),
        );
    }

    if payload.acknowledge_all {
        return match state.store.acknowledge_all().await {
            Ok(updated) => json_response(
                StatusCode::OK,
                json!({ "success": true, "updated": updated }),
            ),
            Err(e) => {
                warn!("bulk acknowledge failed: {}", e);
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to acknowledge notifications", "details": e.to_string() }),
                )
            }
        };
    }

    let Some(id) = payload.id.as_deref().filter(|id| !id.is_empty()) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Missing required fields: id or acknowledgeAll" }),
        );
    };

    match state.store.set_acknowledged(id).await {
        Ok(matched) => json_response(
            StatusCode::OK,
            json!({ "success": true, "updated": if matched { 1 } else { 0 } }),
        ),
        Err(e) => {
            warn!(id = id, "acknowledge failed: {}", e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to acknowledge notification", "details": e.to_string() }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use crate::db::MemoryStore;

    async fn test_state() -> (Arc<AppState>, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn crate::db::AlertStore> = memory.clone();
        let state = Arc::new(AppState::new(Args::for_tests(), store, "memory"));
        (state, memory)
    }

    fn body(v: serde_json::Value) -> Bytes {
        Bytes::from(v.to_string())
    }

    async fn response_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn post(state: &Arc<AppState>, v: serde_json::Value) -> serde_json::Value {
        let resp = handle_notifications_request(
            Arc::clone(state),
            Method::POST,
            "/api/notifications",
            body(v),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        response_json(resp).await
    }

    #[tokio::test]
    async fn test_post_defaults_type_and_priority() {
        let (state, _) = test_state().await;
        let json = post(&state, serde_json::json!({ "title": "X", "message": "Y" })).await;
        assert_eq!(json["notification"]["type"], "notification");
        assert_eq!(json["notification"]["priority"], "medium");
    }

    #[tokio::test]
    async fn test_post_with_explicit_type() {
        let (state, _) = test_state().await;
        let json = post(
            &state,
            serde_json::json!({
                "type": "test_notification",
                "title": "X",
                "message": "Y",
                "priority": "high",
                "site": "example.com",
            }),
        )
        .await;
        assert_eq!(json["notification"]["type"], "test_notification");
        assert_eq!(json["notification"]["metadata"]["site"], "example.com");
    }

    #[tokio::test]
    async fn test_put_single_acknowledge() {
        let (state, _) = test_state().await;
        let stored = post(&state, serde_json::json!({ "title": "X", "message": "Y" })).await;
        let id = stored["notification"]["id"].as_str().unwrap().to_string();

        let resp = handle_notifications_request(
            Arc::clone(&state),
            Method::PUT,
            "/api/notifications",
            body(serde_json::json!({ "id": id, "acknowledged": true })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(response_json(resp).await["updated"], 1);

        let resp = handle_notifications_request(
            state,
            Method::GET,
            "/api/notifications",
            Bytes::new(),
        )
        .await;
        let json = response_json(resp).await;
        assert_eq!(json["notifications"][0]["acknowledged"], true);
    }

    #[tokio::test]
    async fn test_put_acknowledge_all() {
        let (state, _) = test_state().await;
        for i in 0..3 {
            post(
                &state,
                serde_json::json!({ "title": format!("t{}", i), "message": "m" }),
            )
            .await;
        }

        let resp = handle_notifications_request(
            Arc::clone(&state),
            Method::PUT,
            "/api/notifications",
            body(serde_json::json!({ "acknowledgeAll": true })),
        )
        .await;
        assert_eq!(response_json(resp).await["updated"], 3);
    }

    #[tokio::test]
    async fn test_put_without_target_is_400() {
        let (state, _) = test_state().await;
        let resp = handle_notifications_request(
            Arc::clone(&state),
            Method::PUT,
            "/api/notifications",
            body(serde_json::json!({})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Un-acknowledging is rejected: the transition is monotonic
        let resp = handle_notifications_request(
            state,
            Method::PUT,
            "/api/notifications",
            body(serde_json::json!({ "id": "abc", "acknowledged": false })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_is_405() {
        let (state, _) = test_state().await;
        let resp = handle_notifications_request(
            state,
            Method::DELETE,
            "/api/notifications",
            Bytes::new(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
