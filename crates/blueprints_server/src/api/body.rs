//! Request body buffering and JSON decoding.

use http::header::CONTENT_TYPE;
use http::HeaderMap;
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use std::error::Error;

use super::errors::ApiError;

/// Upper bound on buffered request bodies.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Buffers the body (bounded by [`MAX_BODY_BYTES`]) and decodes it as JSON.
///
/// Decode failures are reported as `ValidationFailed` with a `body: ` prefix
/// and the JSON path of the offending field.
pub async fn read_json<T, B>(headers: &HeaderMap, body: B) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    check_json_content_type(headers)?;

    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::ValidationFailed(format!(
                "body: exceeds the {MAX_BODY_BYTES} byte limit"
            )));
        }
        Err(err) => return Err(ApiError::Unexpected(format!("reading request body: {err}"))),
    };

    let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| ApiError::ValidationFailed(format!("body: {err}")))
}

fn check_json_content_type(headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(content_type) = headers.get(CONTENT_TYPE) else {
        return Err(ApiError::ValidationFailed(
            "body: missing `Content-Type: application/json` header".to_string(),
        ));
    };
    let content_type = content_type.to_str().unwrap_or_default();

    let is_json = content_type
        .parse::<mime::Mime>()
        .map(|mime| {
            mime.type_() == mime::APPLICATION
                && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON))
        })
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::ValidationFailed(format!(
            "body: expected `application/json` content type, got `{content_type}`"
        )));
    }
    Ok(())
}
