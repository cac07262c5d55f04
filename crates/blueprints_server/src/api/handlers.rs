//! Endpoint handlers for `/api/v1/blueprints`.
//!
//! Storage calls are blocking; each one runs on the blocking pool with its
//! own pooled connection.

use blueprints_core::{Blueprint, BlueprintService, Point, RepoResult, SqliteBlueprintRepository};
use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Deserialize;

use super::envelope::json_response;
use super::errors::ApiError;
use crate::pool::DbPool;

const EXECUTE_OK: &str = "execute ok";
const BLUEPRINT_CREATED: &str = "Blueprint created successfully";
const POINT_ADDED: &str = "Point added successfully";

type HandlerResult = Result<Response<Full<Bytes>>, ApiError>;

/// Body of `POST /api/v1/blueprints`.
///
/// Fields are optional so that missing values surface as validation messages
/// rather than decode errors.
#[derive(Debug, Default, Deserialize)]
pub struct NewBlueprintRequest {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points: Option<Vec<Point>>,
}

impl NewBlueprintRequest {
    /// Converts into a domain value, or returns the comma-joined
    /// `field: message` list of violations.
    pub fn into_blueprint(self) -> Result<Blueprint, ApiError> {
        let blueprint = Blueprint::new(
            self.author.unwrap_or_default(),
            self.name.unwrap_or_default(),
            self.points.unwrap_or_default(),
        );
        let violations = blueprint.violations();
        if violations.is_empty() {
            return Ok(blueprint);
        }
        let details = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(ApiError::ValidationFailed(details))
    }
}

pub(super) async fn get_all(pool: &DbPool) -> HandlerResult {
    let blueprints = with_service(pool, |service| service.get_all_blueprints()).await?;
    Ok(json_response(StatusCode::OK, EXECUTE_OK, Some(blueprints)))
}

pub(super) async fn get_by_author(pool: &DbPool, author: String) -> HandlerResult {
    let blueprints =
        with_service(pool, move |service| service.get_blueprints_by_author(&author)).await?;
    Ok(json_response(StatusCode::OK, EXECUTE_OK, Some(blueprints)))
}

pub(super) async fn get_one(pool: &DbPool, author: String, name: String) -> HandlerResult {
    let blueprint =
        with_service(pool, move |service| service.get_blueprint(&author, &name)).await?;
    Ok(json_response(StatusCode::OK, EXECUTE_OK, Some(blueprint)))
}

pub(super) async fn create(pool: &DbPool, request: NewBlueprintRequest) -> HandlerResult {
    let blueprint = request.into_blueprint()?;
    with_service(pool, move |service| {
        service.add_new_blueprint(blueprint.author, blueprint.name, blueprint.points)
    })
    .await?;
    Ok(json_response::<()>(
        StatusCode::CREATED,
        BLUEPRINT_CREATED,
        None,
    ))
}

pub(super) async fn add_point(
    pool: &DbPool,
    author: String,
    name: String,
    point: Point,
) -> HandlerResult {
    with_service(pool, move |service| {
        service.add_point(&author, &name, point.x, point.y)
    })
    .await?;
    Ok(json_response::<()>(StatusCode::ACCEPTED, POINT_ADDED, None))
}

/// Runs `op` against a service bound to a pooled connection.
async fn with_service<T, F>(pool: &DbPool, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut BlueprintService<SqliteBlueprintRepository<'_>>) -> RepoResult<T>
        + Send
        + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
        let mut conn = pool.get()?;
        let repo = SqliteBlueprintRepository::try_new(&mut conn)?;
        let mut service = BlueprintService::new(repo);
        Ok(op(&mut service)?)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::NewBlueprintRequest;
    use crate::api::errors::ApiError;
    use blueprints_core::Point;

    #[test]
    fn missing_points_become_empty_sequence() {
        let request: NewBlueprintRequest =
            serde_json::from_str(r#"{"author":"john","name":"house","points":null}"#).unwrap();
        let blueprint = request.into_blueprint().unwrap();
        assert!(blueprint.points.is_empty());
    }

    #[test]
    fn blank_fields_are_joined_in_field_order() {
        let request = NewBlueprintRequest {
            author: None,
            name: Some("  ".to_string()),
            points: Some(vec![Point::new(1, 1)]),
        };
        match request.into_blueprint() {
            Err(ApiError::ValidationFailed(details)) => assert_eq!(
                details,
                "author: must not be blank, name: must not be blank"
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
