pub mod handlers;

use crate::config::Config;
use actix_web::{web, App, HttpServer};

pub use handlers::{AppState, BatchRequestBody, BatchResponseBody};

/// Reference images arrive base64-encoded inside the JSON body.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_BODY_BYTES))
        .route("/health", web::get().to(handlers::health))
        .route("/api/batches", web::post().to(handlers::create_batch))
        .route("/api/batches/archive", web::post().to(handlers::download_batch));
}

pub async fn serve(config: Config) -> std::io::Result<()> {
    let port = config.port.unwrap_or(8080);
    let state = web::Data::new(AppState { config });

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("127.0.0.1", port))?
        .run()
        .await
}
