//! Boundary error type and its translation into HTTP responses.
//!
//! # Invariants
//! - `Unexpected` details are logged, never written to the response body.
//! - Every error response carries the standard envelope.

use blueprints_core::RepoError;
use bytes::Bytes;
use http::header::{HeaderValue, ALLOW};
use http::{Response, StatusCode};
use http_body_util::Full;
use log::error;
use std::fmt::{Display, Formatter};

use super::envelope::json_response;

const ALREADY_EXISTS_MESSAGE: &str = "Blueprint already exists";

#[derive(Debug)]
pub enum ApiError {
    /// Carries the caller-facing message.
    NotFound(String),
    /// Carries the caller-facing message.
    AlreadyExists(String),
    /// Carries the `field: message` detail returned in `data`.
    ValidationFailed(String),
    MethodNotAllowed { allow: &'static str },
    /// Carries internal detail for the logs only.
    Unexpected(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::AlreadyExists(message) => write!(f, "conflict: {message}"),
            Self::ValidationFailed(details) => write!(f, "validation failed: {details}"),
            Self::MethodNotAllowed { allow } => write!(f, "method not allowed; allow: {allow}"),
            Self::Unexpected(details) => write!(f, "unexpected failure: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status();
        match self {
            Self::NotFound(message) | Self::AlreadyExists(message) => {
                json_response::<()>(status, message, None)
            }
            Self::ValidationFailed(details) => {
                json_response(status, "Validation failed", Some(details))
            }
            Self::MethodNotAllowed { allow } => {
                let mut response = json_response::<()>(status, "Method not allowed", None);
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static(allow));
                response
            }
            Self::Unexpected(details) => {
                error!(
                    "event=http_error module=api status=error error_code=unexpected error={}",
                    blueprints_core::logging::truncate_for_log(&details, 512)
                );
                json_response::<()>(status, "Internal server error", None)
            }
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(message) => Self::NotFound(message),
            RepoError::AlreadyExists { .. } => Self::AlreadyExists(ALREADY_EXISTS_MESSAGE.to_string()),
            RepoError::Validation(err) => Self::ValidationFailed(err.to_string()),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(value: r2d2::Error) -> Self {
        Self::Unexpected(format!("connection pool: {value}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Unexpected(format!("storage task: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use blueprints_core::{BlueprintValidationError, RepoError};
    use http::StatusCode;
    use http_body_util::BodyExt;

    #[test]
    fn repo_errors_map_to_boundary_kinds() {
        let not_found = ApiError::from(RepoError::NotFound("Blueprint not found".to_string()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let exists = ApiError::from(RepoError::AlreadyExists {
            author: "john".to_string(),
            name: "house".to_string(),
        });
        assert!(matches!(exists, ApiError::AlreadyExists(ref m) if m == "Blueprint already exists"));
        assert_eq!(exists.status(), StatusCode::BAD_REQUEST);

        let invalid = ApiError::from(RepoError::Validation(BlueprintValidationError::BlankName));
        assert!(matches!(invalid, ApiError::ValidationFailed(ref d) if d == "name: must not be blank"));

        let internal = ApiError::from(RepoError::InvalidData("broken row".to_string()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unexpected_error_body_hides_details() {
        let response =
            ApiError::Unexpected("disk I/O error at /var/lib/secret.db".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["message"], "Internal server error");
        assert!(json["data"].is_null());
    }

    #[test]
    fn method_not_allowed_sets_allow_header() {
        let response = ApiError::MethodNotAllowed { allow: "GET, POST" }.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[http::header::ALLOW], "GET, POST");
    }
}
