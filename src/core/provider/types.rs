//! Wire types for the provider's queue, stream, and storage APIs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to a queue submission.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSubmitResponse {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
}

/// Queue lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    InQueue,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

/// One status poll of a queued request.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub status: QueueState,
    #[serde(default)]
    pub queue_position: Option<u32>,
}

/// Storage upload grant: where to PUT the bytes and where they will live.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadGrant {
    pub upload_url: String,
    pub file_url: String,
}

/// A completed queued run: the submit id plus the raw result payload.
#[derive(Debug, Clone)]
pub struct QueueRun {
    pub request_id: String,
    pub payload: Value,
}

/// One generated image. Models return either a bare URL string or an
/// object with metadata; responses always go out in object form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    File(ImageFile),
    Url(String),
}

impl ImageRef {
    /// Normalize to object form so clients always see `{"url": ...}`.
    pub fn into_file(self) -> ImageFile {
        match self {
            Self::File(file) => file,
            Self::Url(url) => ImageFile {
                url,
                content_type: None,
                width: None,
                height: None,
            },
        }
    }
}

/// Image object as returned by generation models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One image slot. Models sometimes return a single value where a list is
/// expected; [`ImageSet::into_vec`] normalizes both forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageSet {
    Many(Vec<ImageRef>),
    One(ImageRef),
}

impl ImageSet {
    pub fn into_vec(self) -> Vec<ImageRef> {
        match self {
            Self::Many(images) => images,
            Self::One(image) => vec![image],
        }
    }
}

/// Envelope for generation results. Models nest their output differently;
/// extraction order is `data.images`, `data.image`, `images`, `image`,
/// and a populated slot wins even when it holds an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationPayload {
    #[serde(default)]
    pub data: Option<GenerationData>,
    #[serde(default)]
    pub images: Option<ImageSet>,
    #[serde(default)]
    pub image: Option<ImageSet>,
}

/// Nested `data` object used by some generation models.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationData {
    #[serde(default)]
    pub images: Option<ImageSet>,
    #[serde(default)]
    pub image: Option<ImageSet>,
}

impl GenerationPayload {
    /// Extract generated images by the documented precedence. Returns an
    /// empty vec when no slot is populated, or when the winning slot is
    /// itself empty.
    pub fn into_images(self) -> Vec<ImageRef> {
        if let Some(data) = self.data {
            if let Some(images) = data.images {
                return images.into_vec();
            }
            if let Some(image) = data.image {
                return image.into_vec();
            }
        }
        if let Some(images) = self.images {
            return images.into_vec();
        }
        if let Some(image) = self.image {
            return image.into_vec();
        }
        Vec::new()
    }
}

/// Everything collected from one streaming invocation.
#[derive(Debug, Clone, Default)]
pub struct StreamAggregate {
    /// Every event parsed off the stream, in arrival order
    pub events: Vec<Value>,
    /// The last event seen before the stream closed
    pub final_event: Option<Value>,
}

impl StreamAggregate {
    /// Concatenated `data` text of every `message` event, in order.
    pub fn aggregated_message(&self) -> String {
        self.events
            .iter()
            .filter(|event| event.get("type").and_then(Value::as_str) == Some("message"))
            .filter_map(|event| event.get("data").and_then(Value::as_str))
            .collect()
    }

    /// The `output` field of the final event, when present and non-empty.
    pub fn final_output(&self) -> Option<&str> {
        self.final_event
            .as_ref()
            .and_then(|event| event.get("output"))
            .and_then(Value::as_str)
            .filter(|output| !output.is_empty())
    }

    /// The `data` payload of the most recent event that carried one.
    pub fn latest_data(&self) -> Option<Value> {
        self.events
            .iter()
            .rev()
            .find_map(|event| event.get("data").filter(|data| !data.is_null()).cloned())
    }
}
