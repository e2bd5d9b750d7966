pub mod fal_client;
pub mod prompt;

use crate::{
    error::Result,
    models::{GenerationRequest, GenerationResult},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use fal_client::FalClient;
pub use prompt::{compose_prompt, STYLE_DIRECTIVES};

/// One call to an image-generation backend.
///
/// Implementations report rejected credentials as `BenchError::Auth`, rate limits and
/// network trouble as `BenchError::Transient`, and every other API failure as
/// `BenchError::Generation`. They keep no state between calls.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: Arc<GenerationRequest>) -> Result<GenerationResult>;
}

#[async_trait]
impl<C: GenerationClient + ?Sized> GenerationClient for Arc<C> {
    async fn generate(&self, request: Arc<GenerationRequest>) -> Result<GenerationResult> {
        (**self).generate(request).await
    }
}
