// Service configuration loaded from environment variables
// Decision: No DATABASE_URL means in-memory dev mode, never a hard failure

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Process-level settings for the control-plane binary
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL URL; `None` selects the in-memory backend
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
    /// Prefix mounted in front of every route (e.g. "/api")
    pub api_prefix: Option<String>,
    /// Allowed CORS origins; empty means CORS is not enabled
    pub cors_allowed_origins: Vec<String>,
    /// Endpoint receiving outgoing emails as JSON; `None` logs them instead
    pub mail_webhook_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_prefix: None,
            cors_allowed_origins: Vec::new(),
            mail_webhook_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: non_empty_var("DATABASE_URL"),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            api_prefix: non_empty_var("API_PREFIX"),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or_default(),
            mail_webhook_url: non_empty_var("MAIL_WEBHOOK_URL"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
