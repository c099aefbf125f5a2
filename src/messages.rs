use serde::{Deserialize, Deserializer, Serialize};

/// A single labeled result returned by the detection service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Detection {
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub conf: f64,
    /// Box corners `[x1, y1, x2, y2]` in source pixels, when the service sends them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl Detection {
    /// Formats the detection as shown in the result list, e.g. `cat — 87.3%`.
    pub fn display_line(&self) -> String {
        format!("{} — {:.1}%", self.label, self.conf * 100.0)
    }
}

/// Successful payload of `POST /detect`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DetectionResult {
    /// Annotated JPEG, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Detections in service order; `null` or a missing field reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub detections: Vec<Detection>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Detection>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Detection>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw response body as sent by the service, before the `error` field is split off.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetectResponseBody {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(flatten)]
    pub result: DetectionResult,
}

impl DetectionResult {
    /// Lines for the result list; a single placeholder when nothing was detected.
    pub fn display_lines(&self) -> Vec<String> {
        if self.detections.is_empty() {
            return vec![NO_DETECTIONS.to_string()];
        }
        self.detections.iter().map(Detection::display_line).collect()
    }
}

/// Placeholder line shown when the service found nothing.
pub const NO_DETECTIONS: &str = "No detections";
