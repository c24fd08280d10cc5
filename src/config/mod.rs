use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub tokens: TokenConfig,
    pub stories: StoryConfig,
    pub notifications: NotificationConfig,
    pub integrations: IntegrationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub auth0_domain: Option<String>,
    pub auth0_audience: Option<String>,
    /// HS256 secret accepted when no Auth0 tenant is configured
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    #[serde(skip_serializing)]
    pub cron_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub initial_grant: i32,
    pub monthly_amount: i32,
    pub referral_bonus: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    pub max_distance_miles: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(skip_serializing)]
    pub vimeo_access_token: Option<String>,
    pub vimeo_api_base: String,
    #[serde(skip_serializing)]
    pub firebase_service_account: Option<String>,
    pub fcm_api_base: String,
    pub google_token_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("DATECAL_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = non_empty_var("AUTH0_DOMAIN") {
            self.security.auth0_domain = Some(v);
        }
        if let Some(v) = non_empty_var("AUTH0_AUDIENCE") {
            self.security.auth0_audience = Some(v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = non_empty_var("CRON_JOB_SECRET") {
            self.security.cron_secret = Some(v);
        }

        // Token economy overrides
        if let Ok(v) = env::var("TOKENS_INITIAL_GRANT") {
            self.tokens.initial_grant = v.parse().unwrap_or(self.tokens.initial_grant);
        }
        if let Ok(v) = env::var("TOKENS_MONTHLY_AMOUNT") {
            self.tokens.monthly_amount = v.parse().unwrap_or(self.tokens.monthly_amount);
        }
        if let Ok(v) = env::var("TOKENS_REFERRAL_BONUS") {
            self.tokens.referral_bonus = v.parse().unwrap_or(self.tokens.referral_bonus);
        }

        if let Ok(v) = env::var("STORIES_MAX_DISTANCE_MILES") {
            self.stories.max_distance_miles = v.parse().unwrap_or(self.stories.max_distance_miles);
        }
        if let Ok(v) = env::var("NOTIFICATIONS_PAGE_SIZE") {
            self.notifications.page_size = v.parse().unwrap_or(self.notifications.page_size);
        }

        // Integration overrides
        if let Some(v) = non_empty_var("VIMEO_ACCESS_TOKEN") {
            self.integrations.vimeo_access_token = Some(v);
        }
        if let Ok(v) = env::var("VIMEO_API_BASE") {
            self.integrations.vimeo_api_base = v;
        }
        if let Some(v) = non_empty_var("FIREBASE_SERVICE_ACCOUNT") {
            self.integrations.firebase_service_account = Some(v);
        }
        if let Ok(v) = env::var("FCM_API_BASE") {
            self.integrations.fcm_api_base = v;
        }
        if let Ok(v) = env::var("GOOGLE_TOKEN_URL") {
            self.integrations.google_token_url = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
                auth0_domain: None,
                auth0_audience: None,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                cron_secret: None,
            },
            tokens: TokenConfig::default(),
            stories: StoryConfig { max_distance_miles: 200.0 },
            notifications: NotificationConfig { page_size: 15 },
            integrations: IntegrationConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
                auth0_domain: None,
                auth0_audience: None,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cron_secret: None,
            },
            tokens: TokenConfig::default(),
            stories: StoryConfig { max_distance_miles: 200.0 },
            notifications: NotificationConfig { page_size: 15 },
            integrations: IntegrationConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(),
                auth0_domain: None,
                auth0_audience: None,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                cron_secret: None,
            },
            tokens: TokenConfig::default(),
            stories: StoryConfig { max_distance_miles: 200.0 },
            notifications: NotificationConfig { page_size: 15 },
            integrations: IntegrationConfig::default(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            initial_grant: 100,
            monthly_amount: 100,
            referral_bonus: 10,
        }
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            vimeo_access_token: None,
            vimeo_api_base: "https://api.vimeo.com".to_string(),
            firebase_service_account: None,
            fcm_api_base: "https://fcm.googleapis.com".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.tokens.initial_grant, 100);
        assert_eq!(config.notifications.page_size, 15);
        assert!(config.security.cors_origins.contains(&"*".to_string()));
        assert!(config.api.enable_request_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert!(config.security.cors_origins.is_empty());
        assert_eq!(config.stories.max_distance_miles, 200.0);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "super-secret".to_string();
        config.security.cron_secret = Some("cron-secret".to_string());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("cron-secret"));
    }
}
