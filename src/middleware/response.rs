use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// `{"success": true, "data": ...}` envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

/// Successful handler output; the status defaults to 200
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { data, status: StatusCode::OK }
    }

    /// 201, used when a handler inserted a row
    pub fn created(data: T) -> Self {
        Self { data, status: StatusCode::CREATED }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope { success: true, data: self.data };

        // Serialize up front so a bad payload becomes our own 500 body
        match serde_json::to_value(&envelope) {
            Ok(body) => (self.status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                ApiError::internal_server_error("Failed to serialize response data").into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_sets_201() {
        let response = ApiResponse::created(json!({ "id": 1 })).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn success_defaults_to_200() {
        assert_eq!(ApiResponse::success(json!([])).status, StatusCode::OK);
    }
}
