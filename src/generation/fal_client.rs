use crate::{
    config::FalConfig,
    error::{BenchError, Result},
    generation::{compose_prompt, GenerationClient},
    models::{GenerationRequest, GenerationResult},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Serialize)]
struct FalGenerationPayload<'a> {
    prompt: String,
    num_images: u32,
    aspect_ratio: &'a str,
    output_format: &'a str,
    safety_tolerance: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct FalGenerationResponse {
    #[serde(default)]
    images: Vec<FalImage>,
}

#[derive(Debug, Deserialize)]
struct FalImage {
    url: String,
    content_type: Option<String>,
}

/// Flux generation through Fal.ai's synchronous endpoints.
#[derive(Clone)]
pub struct FalClient {
    client: Client,
    config: FalConfig,
    api_key: String,
}

impl FalClient {
    pub fn new(config: FalConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(String::from)
            .ok_or_else(|| BenchError::Config("Fal.ai API key is required".into()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BenchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &FalConfig {
        &self.config
    }

    fn endpoint(&self, request: &GenerationRequest) -> String {
        let model = if request.reference_image().is_some() {
            &self.config.edit_model
        } else {
            &self.config.text_model
        };
        format!("{}/{}", self.config.base_url, model.trim_start_matches('/'))
    }

    fn build_payload<'a>(&'a self, request: &GenerationRequest) -> FalGenerationPayload<'a> {
        FalGenerationPayload {
            prompt: compose_prompt(request),
            num_images: 1,
            aspect_ratio: &self.config.aspect_ratio,
            output_format: &self.config.output_format,
            safety_tolerance: &self.config.safety_tolerance,
            image_urls: request
                .reference_image()
                .map(|image| vec![image.to_data_url()]),
        }
    }

    async fn download_image(&self, image: &FalImage) -> Result<(Vec<u8>, String)> {
        if let Some(rest) = image.url.strip_prefix("data:") {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                BenchError::Generation("Fal returned a malformed data URL".into())
            })?;
            let bytes = BASE64
                .decode(payload)
                .map_err(|e| BenchError::Generation(format!("Fal image is not valid base64: {}", e)))?;
            let mime = header.trim_end_matches(";base64");
            let mime = if mime.is_empty() {
                image.content_type.clone().unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
            } else {
                mime.to_string()
            };
            return Ok((bytes, mime));
        }

        log::debug!("Downloading generated image: {}", image.url);

        let response = self
            .client
            .get(&image.url)
            .send()
            .await
            .map_err(|e| classify_transport_error("image download", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status("Image download", status, &body));
        }

        let content_type = image
            .content_type
            .clone()
            .or_else(|| {
                response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(String::from)
            })
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error("image download", e))?;

        Ok((bytes.to_vec(), content_type))
    }
}

#[async_trait]
impl GenerationClient for FalClient {
    async fn generate(&self, request: Arc<GenerationRequest>) -> Result<GenerationResult> {
        let endpoint = self.endpoint(&request);
        let payload = self.build_payload(&request);

        log::info!("Generating image with endpoint: {}", endpoint);
        log::debug!("Fal prompt: {}", payload.prompt);

        let response = self
            .client
            .post(&endpoint)
            .header(header::AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_transport_error("generation request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status("Fal", status, &body);
            log::warn!("Fal request failed: {}", err);
            return Err(err);
        }

        let body: FalGenerationResponse = response
            .json()
            .await
            .map_err(|e| BenchError::Generation(format!("Failed to parse Fal response: {}", e)))?;

        let image = body
            .images
            .into_iter()
            .next()
            .ok_or_else(|| BenchError::Generation("Fal response returned no images".into()))?;

        let (bytes, content_type) = self.download_image(&image).await?;
        GenerationResult::from_bytes(bytes, content_type, request)
    }
}

/// Maps an unsuccessful HTTP status onto the batch error taxonomy.
pub(crate) fn classify_status(context: &str, status: StatusCode, body: &str) -> BenchError {
    let message = format!("{} returned {}: {}", context, status, truncate(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BenchError::Auth(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => BenchError::Transient(message),
        s if s.is_server_error() => BenchError::Transient(message),
        _ => BenchError::Generation(message),
    }
}

fn classify_transport_error(context: &str, err: reqwest::Error) -> BenchError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        BenchError::Transient(format!("{} failed: {}", context, err))
    } else {
        BenchError::Generation(format!("{} failed: {}", context, err))
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", cut)
    }
}
