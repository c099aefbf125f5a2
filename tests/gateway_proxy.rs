mod common;

use axum::{
    Router,
    extract::Request,
    http::{StatusCode, header},
    routing::get,
};
use common::{MockDetector, spawn_router};
use detect_gateway::{DetectClient, DetectError, GatewayConfig, gateway};
use serde_json::json;

async fn spawn_gateway(config: GatewayConfig) -> String {
    spawn_router(gateway::router(&config).unwrap()).await
}

async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// Relay stand-in that echoes the path and query it was asked for.
async fn spawn_relay() -> String {
    let app = Router::new()
        .route(
            "/snapshot.jpg",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/jpeg")],
                    vec![0xffu8, 0xd8, 0xff, 0xd9],
                )
            }),
        )
        .fallback(|req: Request| async move {
            let host_forwarded = req.headers().contains_key("x-forwarded-marker");
            format!("{} {}", req.uri(), host_forwarded)
        });
    spawn_router(app).await
}

#[tokio::test]
async fn detect_requests_reach_the_detection_server_without_prefix() {
    let detector = MockDetector::json(json!({"detections": [{"label": "cat", "conf": 0.873}]}));
    let detect_upstream = detector.spawn("/detect").await;
    let gateway_url = spawn_gateway(GatewayConfig {
        detect_upstream,
        camera_upstream: closed_port_url().await,
        ..GatewayConfig::default()
    })
    .await;

    let result = DetectClient::new(&gateway_url)
        .submit(b"jpeg".to_vec())
        .await
        .unwrap();

    assert_eq!(result.display_lines(), vec!["cat — 87.3%".to_string()]);
    let uploads = detector.uploads();
    assert_eq!(uploads[0].field, "image");
    assert_eq!(uploads[0].bytes, b"jpeg".to_vec());
}

#[tokio::test]
async fn camera_requests_reach_the_relay_without_prefix() {
    let gateway_url = spawn_gateway(GatewayConfig {
        detect_upstream: closed_port_url().await,
        camera_upstream: spawn_relay().await,
        ..GatewayConfig::default()
    })
    .await;
    let http = reqwest::Client::new();

    let echoed = http
        .get(format!("{gateway_url}/pi/video?fps=5"))
        .header("x-forwarded-marker", "1")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(echoed, "/video?fps=5 true");

    let snapshot = DetectClient::new(&gateway_url)
        .fetch_bytes("/pi/snapshot.jpg")
        .await
        .unwrap();
    assert_eq!(snapshot, vec![0xff, 0xd8, 0xff, 0xd9]);
}

#[tokio::test]
async fn upstream_errors_pass_through() {
    let detector = MockDetector::replying(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let detect_upstream = detector.spawn("/detect").await;
    let gateway_url = spawn_gateway(GatewayConfig {
        detect_upstream,
        camera_upstream: closed_port_url().await,
        ..GatewayConfig::default()
    })
    .await;

    let err = DetectClient::new(&gateway_url)
        .submit(b"jpeg".to_vec())
        .await
        .unwrap_err();

    match err {
        DetectError::HttpError { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let gateway_url = spawn_gateway(GatewayConfig {
        detect_upstream: closed_port_url().await,
        camera_upstream: closed_port_url().await,
        ..GatewayConfig::default()
    })
    .await;

    let response = reqwest::get(format!("{gateway_url}/pi/video")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let err = DetectClient::new(&gateway_url)
        .submit(b"jpeg".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, DetectError::HttpError { status: 502, .. }));
}

#[tokio::test]
async fn serves_health_and_static_files() {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>detect</h1>").unwrap();

    let gateway_url = spawn_gateway(GatewayConfig {
        static_dir: static_dir.path().to_path_buf(),
        detect_upstream: closed_port_url().await,
        camera_upstream: closed_port_url().await,
    })
    .await;
    let client = DetectClient::new(&gateway_url);

    assert_eq!(client.health().await.unwrap(), json!({ "ok": true }));

    let index = reqwest::get(format!("{gateway_url}/")).await.unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    assert_eq!(index.text().await.unwrap(), "<h1>detect</h1>");

    let missing = reqwest::get(format!("{gateway_url}/nope.js")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[test]
fn rejects_invalid_upstreams() {
    let err = gateway::router(&GatewayConfig {
        detect_upstream: "localhost:8000".to_string(),
        ..GatewayConfig::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("localhost:8000"));
}
