// Outbound HTTP integrations: Vimeo (story videos) and Firebase Cloud Messaging (push)
pub mod push;
pub mod vimeo;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} responded with {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential error: {0}")]
    Credentials(String),
}

impl IntegrationError {
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        IntegrationError::Upstream { service, status, body }
    }
}
