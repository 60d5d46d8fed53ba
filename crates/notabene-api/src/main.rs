//! notabene-api - HTTP API server for notabene.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notabene_api::services::{DiskMediaStore, HttpMailSender, HttpMediaStore, LogMailSender};
use notabene_api::{routes, AppConfig, AppState};
use notabene_core::{MailSender, MediaStore};
use notabene_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter (default: "notabene_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notabene_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notabene-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };

    let config = AppConfig::from_env()?;

    // Database + migrations
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    info!(subsystem = "api", op = "startup", "Database ready");

    // Outbound adapters: HTTP when configured, local fallbacks otherwise
    let mailer: Arc<dyn MailSender> = match &config.mail_api_url {
        Some(url) => Arc::new(HttpMailSender::new(url.clone())),
        None => Arc::new(LogMailSender),
    };
    let media: Arc<dyn MediaStore> = match &config.media_upload_url {
        Some(url) => Arc::new(HttpMediaStore::new(url.clone())),
        None => Arc::new(DiskMediaStore::new(
            config.media_dir.clone(),
            config.public_base_url.clone(),
        )),
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        db,
        mailer,
        media,
        config: Arc::new(config),
    };

    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        subsystem = "api",
        op = "startup",
        addr = %bind_addr,
        "notabene-api listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
