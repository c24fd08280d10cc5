use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{self, Claims, JwtError};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub.trim().is_empty() {
            return Err(ApiError::unauthorized("Invalid token: User identifier missing."));
        }
        Ok(Self { user_id: claims.sub })
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    match authenticate(&headers).await {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Err(api_error) => api_error.into_response(),
    }
}

async fn authenticate(headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(|msg| {
        tracing::warn!("Rejected request: {}", msg);
        ApiError::unauthorized(msg)
    })?;

    let verifier = auth::verifier().await.map_err(|e| match e {
        JwtError::KeyFetch(_) => {
            tracing::error!("Token verifier unavailable: {}", e);
            ApiError::service_unavailable("Authentication temporarily unavailable")
        }
        _ => {
            tracing::error!("Token verification not configured: {}", e);
            ApiError::unauthorized("Authentication is not configured")
        }
    })?;

    let claims = verifier.verify(&token).map_err(|e| {
        tracing::warn!("Invalid bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token.")
    })?;

    AuthUser::try_from(claims)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_empty_and_non_bearer() {
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcjpwYXNz")).is_err());
    }

    #[test]
    fn blank_subject_is_unauthorized() {
        let mut claims = Claims::new("someone");
        claims.sub = " ".to_string();
        let err = AuthUser::try_from(claims).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Invalid token: User identifier missing.");
    }
}
