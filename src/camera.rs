use image::RgbImage;

use crate::{error::DetectError, source::encode_jpeg};

/// A video-only stream handed out by a [`CameraDevice`].
pub trait VideoStream: Send {
    /// Width of the most recent frame; zero until the first frame arrives.
    fn frame_width(&self) -> u32;

    /// Copies the current frame.
    fn grab_frame(&mut self) -> Result<RgbImage, DetectError>;

    /// Releases every track held by the stream.
    fn stop_tracks(&mut self);
}

/// Source of video streams, e.g. a webcam or a remote relay.
pub trait CameraDevice: Send {
    /// Requests a new video-only stream. No audio is ever requested.
    fn open_video(&mut self) -> Result<Box<dyn VideoStream>, DetectError>;
}

/// The part of the UI that displays the live feed and the capture control.
pub trait LiveFeed {
    /// Shows the live preview and the capture affordance.
    fn attach_live(&mut self);
    /// Clears the displayed stream and hides the capture affordance.
    fn detach_live(&mut self);
}

/// Whether a [`CameraSession`] currently holds a stream.
#[derive(Clone, Debug, PartialEq)]
pub enum CameraState {
    /// No stream is open.
    Idle,
    /// A stream is open and shown in the live preview.
    Active,
}

impl CameraState {
    /// Returns the state as a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraState::Idle => "idle",
            CameraState::Active => "active",
        }
    }
}

/// Owns at most one open stream from a [`CameraDevice`].
pub struct CameraSession {
    device: Box<dyn CameraDevice>,
    stream: Option<Box<dyn VideoStream>>,
}

impl CameraSession {
    /// Creates an idle session over `device`. No stream is requested yet.
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device,
            stream: None,
        }
    }

    /// Returns the current state of the session.
    pub fn state(&self) -> CameraState {
        match self.stream {
            Some(_) => CameraState::Active,
            None => CameraState::Idle,
        }
    }

    /// True when a stream is open and has reported a non-zero frame width.
    pub fn is_ready(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|stream| stream.frame_width() > 0)
    }

    /// Opens a fresh stream, stopping the current one first.
    pub fn start(&mut self, feed: &mut dyn LiveFeed) -> Result<(), DetectError> {
        if self.stream.is_some() {
            log::debug!("Restarting camera, stopping the active stream first");
            self.stop(feed);
        }

        match self.device.open_video() {
            Ok(stream) => {
                self.stream = Some(stream);
                feed.attach_live();
                log::info!("Camera {}", self.state().as_str());
                Ok(())
            }
            Err(err) => {
                log::warn!("Camera access failed: {err}");
                Err(match err {
                    DetectError::CameraAccessError(_) => err,
                    other => DetectError::CameraAccessError(other.to_string()),
                })
            }
        }
    }

    /// Releases the stream. Safe to call when already idle.
    pub fn stop(&mut self, feed: &mut dyn LiveFeed) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
        feed.detach_live();
        log::info!("Camera {}", self.state().as_str());
    }

    /// Grabs the current frame as JPEG and leaves the stream running.
    pub fn snapshot_jpeg(&mut self) -> Result<Vec<u8>, DetectError> {
        let stream = match self.stream.as_mut() {
            Some(stream) if stream.frame_width() > 0 => stream,
            _ => return Err(DetectError::CameraNotReady),
        };
        let frame = stream.grab_frame()?;
        encode_jpeg(&frame)
    }

    /// Grabs the current frame as JPEG, then stops the session.
    pub fn capture(&mut self, feed: &mut dyn LiveFeed) -> Result<Vec<u8>, DetectError> {
        let jpeg = self.snapshot_jpeg()?;
        self.stop(feed);
        Ok(jpeg)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
    }
}
