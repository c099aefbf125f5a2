use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{camera::LiveFeed, messages::DetectionResult, source::Preview};

/// Display surfaces the detection workflow writes to.
pub trait DetectView: LiveFeed + Send {
    /// Replaces what the preview region shows.
    fn set_preview(&mut self, preview: &Preview);

    /// Replaces the annotated image and makes it visible.
    fn show_annotated(&mut self, jpeg: &[u8]);

    /// Replaces the result list.
    fn show_detections(&mut self, lines: &[String]);

    /// Blocking, dismissible message to the user.
    fn notify(&mut self, message: &str);
}

/// Writes a detection result to the annotated image and result list.
///
/// An empty or invalid annotated image is skipped and the previous one stays;
/// the list is still updated.
pub fn render(view: &mut dyn DetectView, result: &DetectionResult) {
    if let Some(encoded) = result.image.as_deref().filter(|s| !s.is_empty()) {
        match STANDARD.decode(encoded) {
            Ok(jpeg) if !jpeg.is_empty() => view.show_annotated(&jpeg),
            Ok(_) => log::debug!("Annotated image decoded to nothing, keeping the previous one"),
            Err(err) => log::warn!("Annotated image is not valid base64: {err}"),
        }
    }
    view.show_detections(&result.display_lines());
}
