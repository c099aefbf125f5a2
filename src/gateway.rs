use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::{config::GatewayConfig, error::GatewayError};

/// Prefix forwarded to the detection server.
pub const DETECT_PREFIX: &str = "/api";
/// Prefix forwarded to the camera relay.
pub const CAMERA_PREFIX: &str = "/pi";

// Largest request body buffered before forwarding.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

// Connection-scoped headers that must not be forwarded.
static HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Clone)]
struct GatewayState {
    http: reqwest::Client,
    detect_upstream: Arc<str>,
    camera_upstream: Arc<str>,
}

/// Builds the gateway router: static files, `/health`, and the two proxies.
pub fn router(config: &GatewayConfig) -> Result<Router, GatewayError> {
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let state = GatewayState {
        http,
        detect_upstream: validate_upstream(&config.detect_upstream)?,
        camera_upstream: validate_upstream(&config.camera_upstream)?,
    };

    log::debug!(
        "Routing {DETECT_PREFIX} -> {}, {CAMERA_PREFIX} -> {}",
        state.detect_upstream,
        state.camera_upstream
    );

    Ok(Router::new()
        .route("/health", get(health))
        .route(DETECT_PREFIX, any(proxy_detect))
        .route("/api/{*rest}", any(proxy_detect))
        .route(CAMERA_PREFIX, any(proxy_camera))
        .route("/pi/{*rest}", any(proxy_camera))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state))
}

/// Serves the gateway on `listener` until the process is stopped.
pub async fn serve(
    listener: tokio::net::TcpListener,
    config: &GatewayConfig,
) -> Result<(), GatewayError> {
    let app = router(config)?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Rewrites a gateway URI onto `base`, dropping `prefix` and keeping the query.
pub fn upstream_url(base: &str, prefix: &str, uri: &Uri) -> String {
    let path = uri.path();
    let rest = match path.strip_prefix(prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    };
    match uri.query() {
        Some(query) => format!("{}{rest}?{query}", base.trim_end_matches('/')),
        None => format!("{}{rest}", base.trim_end_matches('/')),
    }
}

fn validate_upstream(base: &str) -> Result<Arc<str>, GatewayError> {
    match reqwest::Url::parse(base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(Arc::from(base.trim_end_matches('/')))
        }
        _ => Err(GatewayError::InvalidUpstream(base.to_string())),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn proxy_detect(State(state): State<GatewayState>, req: Request) -> Response {
    forward(&state.http, &state.detect_upstream, DETECT_PREFIX, req).await
}

async fn proxy_camera(State(state): State<GatewayState>, req: Request) -> Response {
    forward(&state.http, &state.camera_upstream, CAMERA_PREFIX, req).await
}

async fn forward(http: &reqwest::Client, base: &str, prefix: &str, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let url = upstream_url(base, prefix, &parts.uri);
    log::debug!("Proxying {} {} -> {url}", parts.method, parts.uri);

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            log::warn!("Failed to read request body for {url}: {err}");
            return (StatusCode::PAYLOAD_TOO_LARGE, err.to_string()).into_response();
        }
    };

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let upstream = http
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await;

    match upstream {
        Ok(upstream) => {
            let status = upstream.status();
            let mut headers = upstream.headers().clone();
            strip_hop_by_hop(&mut headers);

            let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(err) => {
            log::error!("Upstream {url} unavailable: {err}");
            (
                StatusCode::BAD_GATEWAY,
                format!("upstream unavailable: {err}"),
            )
                .into_response()
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}
