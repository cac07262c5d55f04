//! HTTP boundary: routing, decoding and error-to-status translation.
//!
//! # Responsibility
//! - Route requests under `/api/v1/blueprints` to the blueprint service.
//! - Wrap every response in the `{code, message, data}` envelope.
//!
//! # Invariants
//! - Path parameters are percent-decoded before reaching the service.
//! - Unknown paths answer 404 and known paths with a foreign method answer
//!   405 with an `Allow` header.

mod body;
mod envelope;
mod errors;
mod handlers;

pub use body::MAX_BODY_BYTES;
pub use envelope::{json_response, ApiResponse};
pub use errors::ApiError;
pub use handlers::NewBlueprintRequest;

use bytes::Bytes;
use http::header::HeaderValue;
use http::{Method, Request, Response};
use http_body::Body;
use http_body_util::Full;
use log::info;
use percent_encoding::percent_decode_str;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::pool::DbPool;

pub const BASE_PATH: &str = "/api/v1/blueprints";

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Blueprints,
    AuthorBlueprints,
    Blueprint,
    BlueprintPoints,
}

impl Route {
    fn allowed_methods(self) -> &'static str {
        match self {
            Self::Blueprints => "GET, POST",
            Self::AuthorBlueprints | Self::Blueprint => "GET",
            Self::BlueprintPoints => "PUT",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Blueprints => "/api/v1/blueprints",
            Self::AuthorBlueprints => "/api/v1/blueprints/{author}",
            Self::Blueprint => "/api/v1/blueprints/{author}/{name}",
            Self::BlueprintPoints => "/api/v1/blueprints/{author}/{name}/points",
        }
    }
}

/// State shared by every connection: the router and the connection pool.
pub struct ServerState {
    router: matchit::Router<Route>,
    pool: DbPool,
}

impl ServerState {
    pub fn new(pool: DbPool) -> Result<Self, matchit::InsertError> {
        Ok(Self {
            router: build_router()?,
            pool,
        })
    }
}

fn build_router() -> Result<matchit::Router<Route>, matchit::InsertError> {
    let mut router = matchit::Router::new();
    for route in [
        Route::Blueprints,
        Route::AuthorBlueprints,
        Route::Blueprint,
        Route::BlueprintPoints,
    ] {
        router.insert(route.template(), route)?;
    }
    Ok(router)
}

/// Dispatches one request and always produces a response.
pub async fn route_request<B>(request: Request<B>, state: Arc<ServerState>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let started_at = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();

    let (route, result) = dispatch(request, &state).await;
    let mut response = result.unwrap_or_else(ApiError::into_response);

    info!(
        "event=http_request module=api status={} request_id={} method={} route={} status_code={} duration_ms={}",
        if response.status().is_server_error() { "error" } else { "ok" },
        request_id,
        method,
        route.map_or("unmatched", Route::template),
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn dispatch<B>(
    request: Request<B>,
    state: &ServerState,
) -> (Option<Route>, Result<Response<Full<Bytes>>, ApiError>)
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let path = request.uri().path().to_string();
    let Ok(matched) = state.router.at(&path) else {
        return (
            None,
            Err(ApiError::NotFound("Resource not found".to_string())),
        );
    };
    let route = *matched.value;

    let params = match (
        decode_param(matched.params.get("author")),
        decode_param(matched.params.get("name")),
    ) {
        (Ok(author), Ok(name)) => (author, name),
        (Err(err), _) | (_, Err(err)) => return (Some(route), Err(err)),
    };

    let result = match (route, request.method().clone(), params) {
        (Route::Blueprints, Method::GET, _) => handlers::get_all(&state.pool).await,
        (Route::Blueprints, Method::POST, _) => {
            let (parts, payload) = request.into_parts();
            match body::read_json(&parts.headers, payload).await {
                Ok(new_blueprint) => handlers::create(&state.pool, new_blueprint).await,
                Err(err) => Err(err),
            }
        }
        (Route::AuthorBlueprints, Method::GET, (Some(author), _)) => {
            handlers::get_by_author(&state.pool, author).await
        }
        (Route::Blueprint, Method::GET, (Some(author), Some(name))) => {
            handlers::get_one(&state.pool, author, name).await
        }
        (Route::BlueprintPoints, Method::PUT, (Some(author), Some(name))) => {
            let (parts, payload) = request.into_parts();
            match body::read_json(&parts.headers, payload).await {
                Ok(point) => handlers::add_point(&state.pool, author, name, point).await,
                Err(err) => Err(err),
            }
        }
        (route, _, _) => Err(ApiError::MethodNotAllowed {
            allow: route.allowed_methods(),
        }),
    };
    (Some(route), result)
}

fn decode_param(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    raw.map(|value| {
        percent_decode_str(value)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|_| ApiError::ValidationFailed("path: invalid UTF-8 in segment".to_string()))
    })
    .transpose()
}
