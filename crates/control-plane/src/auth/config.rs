// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Default to "none" mode for local development

use std::time::Duration;

/// Authentication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// No authentication required; every request is an anonymous admin
    #[default]
    None,
    /// Bearer / cookie JWT required
    Jwt,
}

impl AuthMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "jwt" => AuthMode::Jwt,
            _ => AuthMode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Jwt => "jwt",
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    /// Expected `iss` claim, checked when set
    pub issuer: Option<String>,
    /// Lifetime of tokens minted by `JwtService::issue`
    pub token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: None,
            token_lifetime: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt: JwtConfig,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mode = std::env::var("AUTH_MODE")
            .map(|s| AuthMode::parse(&s))
            .unwrap_or_default();

        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                if mode == AuthMode::Jwt {
                    tracing::warn!("AUTH_JWT_SECRET not set, tokens will not survive a restart");
                }
                random_secret()
            });

        let token_lifetime = std::env::var("AUTH_JWT_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60 * 60));

        Self {
            mode,
            jwt: JwtConfig {
                secret,
                issuer: std::env::var("AUTH_JWT_ISSUER").ok().filter(|s| !s.is_empty()),
                token_lifetime,
            },
        }
    }

    /// Config for JWT mode with a fixed secret (tests and tooling)
    pub fn jwt(secret: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::Jwt,
            jwt: JwtConfig {
                secret: secret.into(),
                ..Default::default()
            },
        }
    }

    /// Check if authentication is enabled
    pub fn is_enabled(&self) -> bool {
        self.mode != AuthMode::None
    }
}

/// Random per-boot signing secret (64 hex characters)
fn random_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
