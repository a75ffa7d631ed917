//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling; one task per
//! connection, shared state behind `Arc`. Handlers are stateless and
//! safely concurrent across requests.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::db::AlertStore;
use crate::delivery::feed::NotificationFeed;
use crate::routes;
use crate::server::ws;
use crate::topics::TopicResolver;
use crate::types::Result;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// External store the notifications and topics live in
    pub store: Arc<dyn AlertStore>,
    /// Slug-to-topic resolver over the store
    pub resolver: TopicResolver,
    /// Insert-event hub feeding connected clients
    pub feed: Arc<NotificationFeed>,
    /// Store backend label for health reporting
    pub store_backend: &'static str,
    pub started: Instant,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn AlertStore>, store_backend: &'static str) -> Self {
        let resolver = TopicResolver::new(Arc::clone(&store));
        let feed = Arc::new(NotificationFeed::new(args.feed_capacity));

        Self {
            args,
            store,
            resolver,
            feed,
            store_backend,
            started: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Herald listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .with_upgrades()
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method.clone(), path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        // Real-time WebSocket feed of notification inserts
        (Method::GET, "/api/feed") => {
            if hyper_tungstenite::is_upgrade_request(&req) {
                return Ok(to_boxed(ws::handle_feed_upgrade(state, req).await));
            }
            to_boxed(bad_request_response(
                "WebSocket upgrade required for /api/feed",
            ))
        }

        // Topic-scoped notification API (OPTIONS/POST/GET, 405 otherwise)
        (_, p) if p.starts_with("/api/topics/") => {
            let body = match read_body(req).await {
                Ok(b) => b,
                Err(resp) => return Ok(resp),
            };
            to_boxed(routes::handle_topic_request(state, method, &path, body).await)
        }

        // Global notifications API (acknowledgment primary path)
        (_, "/api/notifications") => {
            let body = match read_body(req).await {
                Ok(b) => b,
                Err(resp) => return Ok(resp),
            };
            to_boxed(routes::handle_notifications_request(state, method, &path, body).await)
        }

        // CORS preflight for anything else
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // Not found
        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Collect the request body, mapping failure to a 400 response
async fn read_body(req: Request<Incoming>) -> std::result::Result<Bytes, Response<BoxBody>> {
    match req.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            warn!("Request body error: {}", e);
            Err(to_boxed(bad_request_response("Failed to read request body")))
        }
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    routes::with_cors(Response::builder().status(StatusCode::OK))
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

/// Bad request response
fn bad_request_response(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Bad Request",
        "message": message,
    });

    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
