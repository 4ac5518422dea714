// JWT token service for authentication
// Decision: Use HS256 algorithm for simplicity (symmetric key)
// Decision: Tokens are minted elsewhere; `issue` exists for tests and tooling

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use eventdesk_core::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::JwtConfig;

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub name: String,
    /// "admin" or "user"
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Mint a signed token for a user
    pub fn issue(&self, user_id: Uuid, email: &str, name: &str, role: Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.token_lifetime)?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to encode token")
    }

    /// Validate signature, expiry and (when configured) issuer
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).context("Invalid token")?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_issue_and_validate() {
        let jwt = service("test-secret");
        let user_id = Uuid::now_v7();

        let token = jwt
            .issue(user_id, "ada@example.com", "Ada", Role::Admin)
            .unwrap();
        let claims = jwt.validate(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("secret-a")
            .issue(Uuid::now_v7(), "a@example.com", "A", Role::User)
            .unwrap();
        assert!(service("secret-b").validate(&token).is_err());
    }

    #[test]
    fn test_issuer_checked_when_configured() {
        let plain = service("shared");
        let strict = JwtService::new(JwtConfig {
            secret: "shared".to_string(),
            issuer: Some("eventdesk".to_string()),
            ..Default::default()
        });

        let token = plain
            .issue(Uuid::now_v7(), "a@example.com", "A", Role::User)
            .unwrap();
        assert!(strict.validate(&token).is_err());

        let token = strict
            .issue(Uuid::now_v7(), "a@example.com", "A", Role::User)
            .unwrap();
        assert!(strict.validate(&token).is_ok());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service("s").validate("not.a.jwt").is_err());
    }
}
