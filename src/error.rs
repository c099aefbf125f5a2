/// Errors raised while capturing, submitting, or interpreting a detection request.
///
/// Every variant is terminal for the current attempt; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Neither a file, a captured preview, nor a live frame was available.
    #[error("No image to analyze. Upload a photo or start the camera.")]
    NoImageSource,

    /// The video device could not be opened.
    #[error("Cannot access camera: {0}")]
    CameraAccessError(String),

    /// The camera is stopped or has not produced a frame yet.
    #[error("Camera not ready yet.")]
    CameraNotReady,

    /// The detection endpoint answered with a non-2xx status.
    #[error("HTTP {status} {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not valid JSON; carries the raw body.
    #[error("{0}")]
    MalformedResponse(String),

    /// The detection service reported an error in its JSON payload.
    #[error("{message}")]
    ServiceError { message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Another submission is still pending.
    #[error("A detection request is already in progress.")]
    SubmitInProgress,

    /// Image bytes could not be encoded or decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl From<image::ImageError> for DetectError {
    fn from(err: image::ImageError) -> Self {
        DetectError::InvalidImage(err.to_string())
    }
}

impl From<base64::DecodeError> for DetectError {
    fn from(err: base64::DecodeError) -> Self {
        DetectError::InvalidImage(err.to_string())
    }
}

/// Errors raised by the gateway binary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Binding or serving the listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The upstream HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// An upstream base url is not an absolute http(s) url.
    #[error("invalid upstream url `{0}`")]
    InvalidUpstream(String),
}
