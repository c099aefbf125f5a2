#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use detect_gateway::{
    CameraDevice, CameraSession, DetectError, DetectView, LiveFeed, Preview, VideoStream,
};
use image::RgbImage;

/// Camera whose frame width can be changed while a stream is open.
#[derive(Clone, Default)]
pub struct FakeCamera {
    pub width: Arc<AtomicU32>,
    pub open_streams: Arc<AtomicUsize>,
}

impl FakeCamera {
    pub fn with_width(width: u32) -> Self {
        let camera = Self::default();
        camera.width.store(width, Ordering::SeqCst);
        camera
    }

    pub fn session(&self) -> CameraSession {
        CameraSession::new(Box::new(self.clone()))
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

struct FakeStream {
    camera: FakeCamera,
}

impl VideoStream for FakeStream {
    fn frame_width(&self) -> u32 {
        self.camera.width.load(Ordering::SeqCst)
    }

    fn grab_frame(&mut self) -> Result<RgbImage, DetectError> {
        Ok(RgbImage::from_pixel(
            self.frame_width(),
            3,
            image::Rgb([200, 10, 10]),
        ))
    }

    fn stop_tracks(&mut self) {
        self.camera.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CameraDevice for FakeCamera {
    fn open_video(&mut self) -> Result<Box<dyn VideoStream>, DetectError> {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            camera: self.clone(),
        }))
    }
}

/// Records everything the workflow shows.
#[derive(Default)]
pub struct RecordingView {
    pub preview: Preview,
    pub live: bool,
    pub annotated: Option<Vec<u8>>,
    pub lines: Vec<String>,
    pub notifications: Vec<String>,
}

impl LiveFeed for RecordingView {
    fn attach_live(&mut self) {
        self.live = true;
    }

    fn detach_live(&mut self) {
        self.live = false;
    }
}

impl DetectView for RecordingView {
    fn set_preview(&mut self, preview: &Preview) {
        self.preview = preview.clone();
    }

    fn show_annotated(&mut self, jpeg: &[u8]) {
        self.annotated = Some(jpeg.to_vec());
    }

    fn show_detections(&mut self, lines: &[String]) {
        self.lines = lines.to_vec();
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}

#[derive(Clone, Debug)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// In-process stand-in for the detection server.
#[derive(Clone)]
pub struct MockDetector {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    pub hits: Arc<AtomicUsize>,
    pub uploads: Arc<Mutex<Vec<Upload>>>,
}

impl MockDetector {
    pub fn replying(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
            hits: Arc::new(AtomicUsize::new(0)),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn json(body: serde_json::Value) -> Self {
        Self::replying(StatusCode::OK, body.to_string())
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }

    /// Serves the detector at `path` and returns its base url.
    pub async fn spawn(&self, path: &str) -> String {
        let app = Router::new()
            .route(path, post(detect))
            .with_state(self.clone());
        spawn_router(app).await
    }
}

async fn detect(State(mock): State<MockDetector>, mut multipart: Multipart) -> Response {
    mock.hits.fetch_add(1, Ordering::SeqCst);

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        mock.uploads.lock().unwrap().push(Upload {
            field: field_name,
            file_name,
            bytes,
        });
    }

    if let Some(delay) = mock.delay {
        tokio::time::sleep(delay).await;
    }

    (
        mock.status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        mock.body.clone(),
    )
        .into_response()
}

/// Binds `app` to an ephemeral local port and returns its base url.
pub async fn spawn_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
