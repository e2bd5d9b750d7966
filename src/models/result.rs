use crate::{
    error::Result,
    hashing::{fingerprint, Fingerprint},
    models::GenerationRequest,
};
use std::fmt;
use std::sync::Arc;

/// A generated image together with its fingerprint and the request that produced it.
#[derive(Clone)]
pub struct GenerationResult {
    pub image_bytes: Vec<u8>,
    pub content_type: String,
    pub fingerprint: Fingerprint,
    pub source_request: Arc<GenerationRequest>,
}

impl GenerationResult {
    /// Fingerprints `image_bytes`; fails with `InvalidImage` on an empty payload.
    pub fn from_bytes(
        image_bytes: Vec<u8>,
        content_type: impl Into<String>,
        source_request: Arc<GenerationRequest>,
    ) -> Result<Self> {
        let fingerprint = fingerprint(&image_bytes)?;
        Ok(Self {
            image_bytes,
            content_type: content_type.into(),
            fingerprint,
            source_request,
        })
    }

    /// File extension matching the image's content type.
    pub fn extension(&self) -> &'static str {
        let mime = self
            .content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

impl fmt::Debug for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationResult")
            .field("fingerprint", &self.fingerprint)
            .field("content_type", &self.content_type)
            .field("len", &self.image_bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;

    fn request() -> Arc<GenerationRequest> {
        Arc::new(GenerationRequest::new(Some("ring".into()), None, None).unwrap())
    }

    #[test]
    fn test_from_bytes_fingerprints_content() {
        let result = GenerationResult::from_bytes(vec![1, 2, 3], "image/jpeg", request()).unwrap();
        assert_eq!(result.fingerprint, fingerprint(&[1, 2, 3]).unwrap());
        assert_eq!(result.source_request.prompt(), Some("ring"));
    }

    #[test]
    fn test_from_bytes_rejects_empty_payload() {
        let err = GenerationResult::from_bytes(Vec::new(), "image/jpeg", request()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidImage(_)));
    }

    #[test]
    fn test_extension_from_content_type() {
        let ext = |mime: &str| {
            GenerationResult::from_bytes(vec![1], mime, request())
                .unwrap()
                .extension()
        };
        assert_eq!(ext("image/png"), "png");
        assert_eq!(ext("IMAGE/WEBP"), "webp");
        assert_eq!(ext("image/jpeg; charset=binary"), "jpg");
        assert_eq!(ext("application/octet-stream"), "jpg");
    }
}
