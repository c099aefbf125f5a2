use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::{camera::CameraSession, error::DetectError};

/// JPEG quality used for frames grabbed from the camera.
pub const JPEG_QUALITY: u8 = 92;

const DATA_URL_JPEG_PREFIX: &str = "data:image/jpeg;base64,";

/// What the preview region currently shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Preview {
    /// Nothing has been shown yet.
    #[default]
    Empty,
    /// A chosen file, shown by reference. Its bytes live in the file selection.
    File,
    /// A captured frame held as a `data:` URL.
    DataUrl(String),
}

impl Preview {
    /// Bytes of a previously captured frame, if the preview holds a decodable data URL.
    pub fn captured_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Preview::DataUrl(url) => match decode_data_url(url) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!("Ignoring malformed preview data url: {err}");
                    None
                }
            },
            Preview::Empty | Preview::File => None,
        }
    }
}

/// The image bytes chosen for one submission, tagged with where they came from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Raw bytes of the file chosen in the file picker.
    FileBytes(Vec<u8>),
    /// Decoded payload of a captured preview's data URL.
    DataUrlBytes(Vec<u8>),
    /// A JPEG encoded from the live camera frame.
    LiveFrameBytes(Vec<u8>),
}

impl ImageSource {
    /// Returns the source kind as a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::FileBytes(_) => "file",
            ImageSource::DataUrlBytes(_) => "captured preview",
            ImageSource::LiveFrameBytes(_) => "live frame",
        }
    }

    /// Returns the image bytes, whichever source they came from.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ImageSource::FileBytes(bytes)
            | ImageSource::DataUrlBytes(bytes)
            | ImageSource::LiveFrameBytes(bytes) => bytes,
        }
    }
}

/// Picks the bytes to submit: selected file, then captured preview, then a live frame.
///
/// The live frame is only grabbed when neither of the other sources is present,
/// and grabbing it leaves the camera running.
pub fn resolve(
    selected_file: Option<&[u8]>,
    preview: &Preview,
    camera: &mut CameraSession,
) -> Result<ImageSource, DetectError> {
    let captured = match selected_file {
        Some(_) => None,
        None => preview.captured_bytes(),
    };

    let source = match (selected_file, captured, camera.is_ready()) {
        (Some(bytes), _, _) => ImageSource::FileBytes(bytes.to_vec()),
        (None, Some(bytes), _) => ImageSource::DataUrlBytes(bytes),
        (None, None, true) => ImageSource::LiveFrameBytes(camera.snapshot_jpeg()?),
        (None, None, false) => return Err(DetectError::NoImageSource),
    };

    log::debug!("Resolved image source: {}", source.as_str());
    Ok(source)
}

/// Encodes an RGB frame as JPEG at [`JPEG_QUALITY`].
pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, DetectError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(frame)?;
    Ok(buf)
}

/// Wraps JPEG bytes in a `data:image/jpeg;base64,` URL.
pub fn to_data_url(jpeg: &[u8]) -> String {
    format!("{DATA_URL_JPEG_PREFIX}{}", STANDARD.encode(jpeg))
}

/// Decodes the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, DetectError> {
    let (meta, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| DetectError::InvalidImage("not a data url".to_string()))?;

    if !meta.ends_with(";base64") {
        return Err(DetectError::InvalidImage(
            "data url is not base64 encoded".to_string(),
        ));
    }

    Ok(STANDARD.decode(payload.trim())?)
}
