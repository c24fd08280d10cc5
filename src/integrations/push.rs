use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::IntegrationError;
use crate::config;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh the OAuth token this long before Google says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A single device push
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub device_token: String,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub data: BTreeMap<String, String>,
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError>;
}

/// Used when no Firebase credentials are configured
pub struct LogNotifier;

#[async_trait]
impl PushNotifier for LogNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError> {
        info!(
            title = %message.title,
            kind = message.data.get("type").map(String::as_str).unwrap_or("-"),
            "push delivery disabled, notification not sent"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Firebase Cloud Messaging HTTP v1 sender
pub struct FcmNotifier {
    http: reqwest::Client,
    account: ServiceAccount,
    signing_key: EncodingKey,
    api_base: String,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl FcmNotifier {
    pub fn new(account: ServiceAccount, api_base: &str, token_url: &str) -> Result<Self, IntegrationError> {
        let signing_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| IntegrationError::Credentials(e.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            account,
            signing_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            cached: Mutex::new(None),
        })
    }

    pub fn from_service_account_json(raw: &str, api_base: &str, token_url: &str) -> Result<Self, IntegrationError> {
        let account: ServiceAccount =
            serde_json::from_str(raw).map_err(|e| IntegrationError::Credentials(e.to_string()))?;
        Self::new(account, api_base, token_url)
    }

    fn signed_assertion(&self) -> Result<String, IntegrationError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: FCM_SCOPE,
            aud: &self.token_url,
            iat: now,
            exp: now + 3600,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| IntegrationError::Credentials(e.to_string()))
    }

    async fn access_token(&self) -> Result<String, IntegrationError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.signed_assertion()?;
        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IntegrationError::from_response("google-oauth", response).await);
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!("Obtained FCM access token valid for {:?}", lifetime);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn payload(message: &PushMessage) -> serde_json::Value {
        let image = message.image_url.as_deref();
        let mut notification = json!({ "title": message.title, "body": message.body });
        if let Some(image) = image {
            notification["image"] = json!(image);
        }

        let mut body = json!({
            "message": {
                "token": message.device_token,
                "notification": notification,
                "data": message.data,
                "apns": { "payload": { "aps": { "mutable-content": 1 } } }
            }
        });
        if let Some(image) = image {
            body["message"]["android"] = json!({ "notification": { "image": image } });
            body["message"]["apns"]["fcm_options"] = json!({ "image": image });
        }
        body
    }
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError> {
        let token = self.access_token().await?;
        let url = format!("{}/v1/projects/{}/messages:send", self.api_base, self.account.project_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&Self::payload(message))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IntegrationError::from_response("fcm", response).await)
        }
    }
}

static NOTIFIER: Lazy<Arc<dyn PushNotifier>> = Lazy::new(|| {
    let integrations = &config::config().integrations;
    match integrations.firebase_service_account.as_deref() {
        Some(raw) => match FcmNotifier::from_service_account_json(
            raw,
            &integrations.fcm_api_base,
            &integrations.google_token_url,
        ) {
            Ok(fcm) => Arc::new(fcm),
            Err(e) => {
                error!("Invalid Firebase service account, push disabled: {}", e);
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    }
});

/// Process-wide notifier selected from config
pub fn notifier() -> Arc<dyn PushNotifier> {
    NOTIFIER.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use jsonwebtoken::{DecodingKey, Validation};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/fcm_test_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/fcm_test_key.pub.pem");

    fn account() -> ServiceAccount {
        ServiceAccount {
            project_id: "datecal-test".to_string(),
            client_email: "push@datecal-test.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
        }
    }

    fn message(image: Option<&str>) -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), "DATE_PROPOSAL".to_string());
        data.insert("dateId".to_string(), "d-1".to_string());
        PushMessage {
            device_token: "device-abc".to_string(),
            title: "New Date Proposal! ✨".to_string(),
            body: "Sam proposed a date at Cafe. Tap to see details!".to_string(),
            image_url: image.map(str::to_string),
            data,
        }
    }

    #[test]
    fn assertion_is_signed_for_token_endpoint() {
        let fcm = FcmNotifier::new(account(), "https://fcm.example", "https://oauth.example/token").unwrap();
        let assertion = fcm.signed_assertion().unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth.example/token"]);
        let decoded = jsonwebtoken::decode::<serde_json::Value>(
            &assertion,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims["iss"], "push@datecal-test.iam.gserviceaccount.com");
        assert_eq!(decoded.claims["scope"], FCM_SCOPE);
    }

    #[test]
    fn payload_carries_image_only_when_present() {
        let with_image = FcmNotifier::payload(&message(Some("https://img/p.jpg")));
        assert_eq!(with_image["message"]["notification"]["image"], "https://img/p.jpg");
        assert_eq!(with_image["message"]["android"]["notification"]["image"], "https://img/p.jpg");
        assert_eq!(with_image["message"]["data"]["dateId"], "d-1");

        let without = FcmNotifier::payload(&message(None));
        assert!(without["message"]["notification"].get("image").is_none());
        assert!(without["message"].get("android").is_none());
    }

    #[test]
    fn rejects_malformed_service_account() {
        assert!(FcmNotifier::from_service_account_json("{}", "https://fcm", "https://token").is_err());
    }

    #[tokio::test]
    async fn sends_with_cached_oauth_token() {
        let server = MockServer::start_async().await;
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/token").body_contains("grant-type%3Ajwt-bearer");
                then.status(200).json_body(json!({ "access_token": "ya29.test", "expires_in": 3600 }));
            })
            .await;
        let send_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/projects/datecal-test/messages:send")
                    .header("authorization", "Bearer ya29.test");
                then.status(200).json_body(json!({ "name": "projects/datecal-test/messages/1" }));
            })
            .await;

        let fcm = FcmNotifier::new(account(), &server.base_url(), &server.url("/token")).unwrap();
        fcm.send(&message(None)).await.unwrap();
        fcm.send(&message(None)).await.unwrap();

        token_mock.assert_hits_async(1).await;
        send_mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(json!({ "access_token": "ya29.test", "expires_in": 3600 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/projects/datecal-test/messages:send");
                then.status(404).body("UNREGISTERED");
            })
            .await;

        let fcm = FcmNotifier::new(account(), &server.base_url(), &server.url("/token")).unwrap();
        let err = fcm.send(&message(None)).await.unwrap_err();
        assert!(matches!(err, IntegrationError::Upstream { status: 404, .. }));
    }
}
