use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};

use crate::{
    error::DetectError,
    messages::{DetectResponseBody, DetectionResult},
};

/// Path of the detection endpoint, relative to the gateway.
pub const DETECT_PATH: &str = "/api/detect";
/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";
/// File name attached to the uploaded image.
pub const IMAGE_FILENAME: &str = "frame.jpg";

/// Posts images to the gateway's detection endpoint.
#[derive(Clone, Debug)]
pub struct DetectClient {
    http: reqwest::Client,
    base_url: String,
}

impl DetectClient {
    /// Creates a client for the gateway at `base_url`, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Creates a client that reuses an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Returns the gateway base url, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Uploads `jpeg` as the `image` field and interprets the reply.
    pub async fn submit(&self, jpeg: Vec<u8>) -> Result<DetectionResult, DetectError> {
        log::debug!("Submitting {} bytes for detection", jpeg.len());

        let part = Part::bytes(jpeg)
            .file_name(IMAGE_FILENAME)
            .mime_str("image/jpeg")?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .http
            .post(format!("{}{}", self.base_url, DETECT_PATH))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        interpret_response(status, &body)
    }

    /// Fetches raw bytes from a gateway path, e.g. `/pi/snapshot.jpg`.
    pub async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, DetectError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectError::HttpError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Queries the gateway's `/health` endpoint.
    pub async fn health(&self) -> Result<serde_json::Value, DetectError> {
        let bytes = self.fetch_bytes("/health").await?;
        serde_json::from_slice(&bytes)
            .map_err(|_| DetectError::MalformedResponse(String::from_utf8_lossy(&bytes).into()))
    }
}

/// Maps a detection reply onto a result or one of the submit errors.
///
/// A non-2xx status wins over everything else. A 2xx body must be JSON, and an
/// `error` field in it is reported as a service error.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<DetectionResult, DetectError> {
    if !status.is_success() {
        return Err(DetectError::HttpError {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let parsed: DetectResponseBody = serde_json::from_str(body)
        .map_err(|_| DetectError::MalformedResponse(body.to_string()))?;

    if let Some(message) = parsed.error.as_ref().and_then(service_error_message) {
        return Err(DetectError::ServiceError { message });
    }

    Ok(parsed.result)
}

// null, false, 0 and "" do not count as an error
fn service_error_message(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
