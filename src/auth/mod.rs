use chrono::{Duration, Utc};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity-provider subject; doubles as our user id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            aud: None,
            iss: None,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("No token verification method configured")]
    NotConfigured,

    #[error("Failed to load signing keys: {0}")]
    KeyFetch(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Issue an HS256 token signed with the configured development secret
pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verifies bearer tokens either against an Auth0 JWKS (RS256) or a shared HS256 secret
pub enum TokenVerifier {
    Jwks {
        keys: JwkSet,
        issuer: String,
        audience: Option<String>,
    },
    Secret {
        key: DecodingKey,
        audience: Option<String>,
    },
}

impl TokenVerifier {
    pub fn from_secret(secret: &str, audience: Option<String>) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(TokenVerifier::Secret {
            key: DecodingKey::from_secret(secret.as_bytes()),
            audience,
        })
    }

    /// Download the tenant's signing keys from `https://{domain}/.well-known/jwks.json`
    pub async fn from_auth0(domain: &str, audience: Option<String>) -> Result<Self, JwtError> {
        let domain = domain.trim_start_matches("https://").trim_end_matches('/');
        let jwks_url = format!("https://{}/.well-known/jwks.json", domain);
        let keys = reqwest::get(&jwks_url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| JwtError::KeyFetch(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| JwtError::KeyFetch(e.to_string()))?;

        info!("Loaded {} signing keys from {}", keys.keys.len(), jwks_url);
        Ok(TokenVerifier::Jwks {
            keys,
            issuer: format!("https://{}/", domain),
            audience,
        })
    }

    async fn from_config() -> Result<Self, JwtError> {
        let security = &config::config().security;
        match (&security.auth0_domain, security.jwt_secret.is_empty()) {
            (Some(domain), _) => Self::from_auth0(domain, security.auth0_audience.clone()).await,
            (None, false) => Self::from_secret(&security.jwt_secret, security.auth0_audience.clone()),
            (None, true) => Err(JwtError::NotConfigured),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let (key, validation) = match self {
            TokenVerifier::Jwks { keys, issuer, audience } => {
                let header = decode_header(token).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
                let kid = header
                    .kid
                    .ok_or_else(|| JwtError::InvalidToken("missing key id".to_string()))?;
                let jwk = keys
                    .find(&kid)
                    .ok_or_else(|| JwtError::InvalidToken(format!("unknown key id {}", kid)))?;
                let key = DecodingKey::from_jwk(jwk).map_err(|e| JwtError::InvalidToken(e.to_string()))?;

                let mut validation = Validation::new(Algorithm::RS256);
                validation.set_issuer(&[issuer]);
                apply_audience(&mut validation, audience.as_deref());
                (key, validation)
            }
            TokenVerifier::Secret { key, audience } => {
                let mut validation = Validation::new(Algorithm::HS256);
                apply_audience(&mut validation, audience.as_deref());
                (key.clone(), validation)
            }
        };

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

fn apply_audience(validation: &mut Validation, audience: Option<&str>) {
    match audience {
        Some(aud) => {
            validation.set_audience(&[aud]);
            validation.required_spec_claims.insert("aud".to_string());
        }
        None => validation.validate_aud = false,
    }
}

static VERIFIER: OnceCell<TokenVerifier> = OnceCell::const_new();

/// Shared verifier; a failed JWKS download is retried on the next request
pub async fn verifier() -> Result<&'static TokenVerifier, JwtError> {
    VERIFIER.get_or_try_init(TokenVerifier::from_config).await
}

/// Build the verifier at startup so the JWKS download happens before the
/// first request. Failure is not fatal; `verifier()` tries again later.
pub async fn prime_verifier() {
    match verifier().await {
        Ok(TokenVerifier::Jwks { keys, .. }) => info!("Loaded {} Auth0 signing keys", keys.keys.len()),
        Ok(TokenVerifier::Secret { .. }) => info!("Accepting HS256 tokens signed with JWT_SECRET"),
        Err(e) => tracing::warn!("Token verifier not ready at startup: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn secret_verifier_accepts_own_tokens() {
        let verifier = TokenVerifier::from_secret("test-secret", None).unwrap();
        let token = sign(&Claims::new("auth0|alice"), "test-secret");
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, "auth0|alice");
    }

    #[test]
    fn secret_verifier_rejects_wrong_secret_and_expired_tokens() {
        let verifier = TokenVerifier::from_secret("test-secret", None).unwrap();
        assert!(verifier.verify(&sign(&Claims::new("bob"), "other-secret")).is_err());

        let mut expired = Claims::new("bob");
        expired.exp = Utc::now().timestamp() - 3600;
        assert!(verifier.verify(&sign(&expired, "test-secret")).is_err());
    }

    #[test]
    fn audience_is_enforced_when_configured() {
        let verifier = TokenVerifier::from_secret("s", Some("https://api.datecal".to_string())).unwrap();
        let mut claims = Claims::new("carol");
        assert!(verifier.verify(&sign(&claims, "s")).is_err());

        claims.aud = Some(serde_json::json!("https://api.datecal"));
        assert!(verifier.verify(&sign(&claims, "s")).is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenVerifier::from_secret("", None), Err(JwtError::InvalidSecret)));
    }
}
