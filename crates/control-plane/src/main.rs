// Eventdesk API server
// Decision: No DATABASE_URL runs the in-memory backend so the API works out of the box
// Decision: Side effects go to a mail webhook when configured, otherwise to the log

use std::sync::Arc;

use anyhow::{Context, Result};
use eventdesk_control_plane::auth::AuthConfig;
use eventdesk_control_plane::config::AppConfig;
use eventdesk_control_plane::services::{HttpMailer, LogMailer, Mailer};
use eventdesk_control_plane::storage::StorageBackend;
use eventdesk_control_plane::AppContext;
use eventdesk_core::telemetry::{init_tracing, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; real environment variables win
    dotenvy::dotenv().ok();

    // Configure via RUST_LOG and LOG_FORMAT (text|json)
    init_tracing(TelemetryConfig::from_env());

    tracing::info!("eventdesk-control-plane starting...");

    let config = AppConfig::from_env();

    let storage = match &config.database_url {
        Some(url) => {
            let backend = StorageBackend::postgres(url, config.db_max_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            backend
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Mail webhook configured");
            Arc::new(HttpMailer::new(url.clone()).context("Failed to build mail client")?)
        }
        None => {
            tracing::info!("Mail webhook not configured, emails are logged only");
            Arc::new(LogMailer)
        }
    };

    let auth_config = AuthConfig::from_env();
    tracing::info!(mode = auth_config.mode.as_str(), "Authentication configured");

    if let Some(prefix) = &config.api_prefix {
        tracing::info!(prefix = %prefix, "API prefix configured");
    }
    if config.cors_allowed_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?config.cors_allowed_origins, "CORS origins configured");
    }

    let ctx = AppContext::new(Arc::new(storage), mailer, auth_config);
    let app = ctx.router(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
