//! HTTP mapping of [`AppforgeError`]

use appforge_core::AppforgeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error returned by handlers, rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError(pub AppforgeError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppforgeError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppforgeError::NotFound(_) => StatusCode::NOT_FOUND,
            AppforgeError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller
    pub fn detail(&self) -> String {
        match &self.0 {
            AppforgeError::Auth(msg)
            | AppforgeError::NotFound(msg)
            | AppforgeError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<AppforgeError> for ApiError {
    fn from(e: AppforgeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppforgeError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (AppforgeError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppforgeError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppforgeError::Publish("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppforgeError::Other("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_detail() {
        assert_eq!(ApiError(AppforgeError::Auth("Invalid secret".into())).detail(), "Invalid secret");
        assert_eq!(
            ApiError(AppforgeError::Config("bad".into())).detail(),
            "Configuration error: bad"
        );
    }
}
