use jewelbench::{
    config::Config,
    logger::{self, LoggerConfig},
    server,
};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let logger_config = match env::var("JEWELBENCH_ENV").as_deref() {
        Ok("production") => LoggerConfig::production(),
        _ => LoggerConfig::development(),
    };
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("{}", e);
    }

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    if config.fal.api_key.is_none() {
        log::warn!("⚠️  FAL_KEY not set, every batch request must carry its own api_key");
    }

    logger::log_startup_info("JewelBench", env!("CARGO_PKG_VERSION"), config.port.unwrap_or(8080));
    logger::log_config_info(&config);

    server::serve(config).await
}
