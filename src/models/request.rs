use crate::error::{BenchError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Compositional constraint attached to every request of every batch.
pub const ANGLE_HINT: &str = "3/4 view";

/// Number of unique images a batch aims for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BatchSize {
    TwentyFive,
    Fifty,
    SeventyFive,
    Hundred,
}

impl BatchSize {
    pub const ALL: [BatchSize; 4] = [
        BatchSize::TwentyFive,
        BatchSize::Fifty,
        BatchSize::SeventyFive,
        BatchSize::Hundred,
    ];

    pub fn count(&self) -> usize {
        match self {
            BatchSize::TwentyFive => 25,
            BatchSize::Fifty => 50,
            BatchSize::SeventyFive => 75,
            BatchSize::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for BatchSize {
    type Error = BenchError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            25 => Ok(BatchSize::TwentyFive),
            50 => Ok(BatchSize::Fifty),
            75 => Ok(BatchSize::SeventyFive),
            100 => Ok(BatchSize::Hundred),
            other => Err(BenchError::InvalidRequest(format!(
                "batch size must be one of 25, 50, 75 or 100 (got {})",
                other
            ))),
        }
    }
}

impl From<BatchSize> for u32 {
    fn from(size: BatchSize) -> Self {
        size.count() as u32
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Uploaded image that image-to-image generations are based on.
#[derive(Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ReferenceImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(BenchError::InvalidImage("reference image is empty".into()));
        }
        Ok(Self {
            bytes,
            content_type: content_type.into(),
        })
    }

    /// Accepts either a `data:<mime>;base64,<payload>` URL or bare base64.
    /// `content_type` is used for bare base64 and defaults to `image/jpeg`.
    pub fn from_base64(encoded: &str, content_type: Option<&str>) -> Result<Self> {
        let encoded = encoded.trim();
        let (mime, payload) = match encoded.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    BenchError::InvalidImage("data URL is missing its payload".into())
                })?;
                let mime = header.trim_end_matches(";base64");
                (mime.to_string(), payload)
            }
            None => (
                content_type.unwrap_or("image/jpeg").to_string(),
                encoded,
            ),
        };

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| BenchError::InvalidImage(format!("reference image is not valid base64: {}", e)))?;
        Self::new(bytes, mime)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.bytes))
    }
}

impl fmt::Debug for ReferenceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceImage")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One generation call's inputs. Built fresh for every attempt from the batch's fixed inputs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    prompt: Option<String>,
    reference_image: Option<Arc<ReferenceImage>>,
    style_tag: Option<String>,
}

impl GenerationRequest {
    pub fn new(
        prompt: Option<String>,
        reference_image: Option<Arc<ReferenceImage>>,
        style_tag: Option<String>,
    ) -> Result<Self> {
        let prompt = prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let style_tag = style_tag
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if prompt.is_none() && reference_image.is_none() {
            return Err(BenchError::InvalidRequest(
                "a prompt, a reference image, or both are required".into(),
            ));
        }

        Ok(Self {
            prompt,
            reference_image,
            style_tag,
        })
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn reference_image(&self) -> Option<&ReferenceImage> {
        self.reference_image.as_deref()
    }

    pub fn style_tag(&self) -> Option<&str> {
        self.style_tag.as_deref()
    }

    pub fn angle_hint(&self) -> &'static str {
        ANGLE_HINT
    }
}
