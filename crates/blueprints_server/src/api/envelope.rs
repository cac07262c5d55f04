//! JSON response envelope shared by every endpoint.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use http_body_util::Full;
use log::error;
use serde::Serialize;

/// `{code, message, data}` wrapper; `code` mirrors the HTTP status.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

/// Builds a JSON response wrapped in [`ApiResponse`].
pub fn json_response<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: Option<T>,
) -> Response<Full<Bytes>> {
    let envelope = ApiResponse {
        code: status.as_u16(),
        message: message.into(),
        data,
    };

    let (status, body) = match serde_json::to_vec(&envelope) {
        Ok(body) => (status, Bytes::from(body)),
        Err(err) => {
            error!("event=http_response module=api status=error error_code=serialize_failed error={err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(
                    br#"{"code":500,"message":"Internal server error","data":null}"#,
                ),
            )
        }
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
