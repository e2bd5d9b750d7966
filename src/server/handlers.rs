use crate::{
    archive::{self, ARCHIVE_FILE_NAME, ARCHIVE_MIME},
    batch::BatchOrchestrator,
    config::Config,
    error::{BenchError, Result},
    generation::FalClient,
    models::{BatchReport, BatchSize, BatchSummary, ReferenceImage},
};
use actix_web::{
    http::{header, StatusCode},
    web, HttpResponse, ResponseError,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub struct AppState {
    pub config: Config,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequestBody {
    pub batch_size: u32,
    pub prompt: Option<String>,
    /// Base64 payload or `data:` URL.
    pub reference_image: Option<String>,
    pub reference_content_type: Option<String>,
    pub style_tag: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponseBody {
    pub status: &'static str,
    pub reason: Option<String>,
    pub summary: BatchSummary,
    pub file_name: &'static str,
    pub archive_base64: String,
}

impl ResponseError for BenchError {
    fn status_code(&self) -> StatusCode {
        match self {
            BenchError::InvalidRequest(_) | BenchError::InvalidImage(_) | BenchError::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            BenchError::Auth(_) => StatusCode::UNAUTHORIZED,
            BenchError::Transient(_) | BenchError::Generation(_) => StatusCode::BAD_GATEWAY,
            BenchError::Archive(_) | BenchError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn create_batch(
    state: web::Data<AppState>,
    body: web::Json<BatchRequestBody>,
) -> Result<HttpResponse> {
    let response = run_batch_request(&state.config, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Same batch as [`create_batch`], answered with the zip itself as an attachment. The outcome
/// travels in `X-JewelBench-Status` and `X-JewelBench-Accepted`.
pub async fn download_batch(
    state: web::Data<AppState>,
    body: web::Json<BatchRequestBody>,
) -> Result<HttpResponse> {
    let (report, archive_bytes) = execute_batch(&state.config, body.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .content_type(ARCHIVE_MIME)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ARCHIVE_FILE_NAME),
        ))
        .insert_header(("X-JewelBench-Status", report.outcome.status()))
        .insert_header(("X-JewelBench-Accepted", report.summary.accepted.to_string()))
        .body(archive_bytes))
}

/// Runs one batch for a form submission. The archive is returned even when the batch
/// stopped early, so completed images are never lost.
pub async fn run_batch_request(config: &Config, body: BatchRequestBody) -> Result<BatchResponseBody> {
    let (report, archive_bytes) = execute_batch(config, body).await?;

    Ok(BatchResponseBody {
        status: report.outcome.status(),
        reason: report.reason(),
        summary: report.summary,
        file_name: ARCHIVE_FILE_NAME,
        archive_base64: BASE64.encode(archive_bytes),
    })
}

async fn execute_batch(config: &Config, body: BatchRequestBody) -> Result<(BatchReport, Vec<u8>)> {
    let target = BatchSize::try_from(body.batch_size)?;

    let reference_image = body
        .reference_image
        .as_deref()
        .map(str::trim)
        .filter(|encoded| !encoded.is_empty())
        .map(|encoded| ReferenceImage::from_base64(encoded, body.reference_content_type.as_deref()))
        .transpose()?;

    let mut fal_config = config.fal.clone();
    if let Some(api_key) = body.api_key.filter(|key| !key.trim().is_empty()) {
        fal_config.api_key = Some(api_key);
    }
    let client = FalClient::new(fal_config)?;

    let mut settings = config.batch.clone();
    if let Some(style_tag) = body.style_tag {
        settings.style_tag = Some(style_tag);
    }

    let orchestrator = BatchOrchestrator::new(client, settings);
    let report = orchestrator
        .run_batch(target, body.prompt, reference_image)
        .await?;

    let archive_bytes = archive::build(&report.results)?;
    Ok((report, archive_bytes))
}
