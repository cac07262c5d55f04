//! Blueprint use-case service.
//!
//! # Responsibility
//! - Provide the business API for creating, reading and extending blueprints.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Repository errors are passed through unchanged.

use crate::model::blueprint::{Blueprint, Point};
use crate::repo::blueprint_repo::{BlueprintRepository, RepoResult};

/// Use-case service wrapper for blueprint operations.
pub struct BlueprintService<R: BlueprintRepository> {
    repo: R,
}

impl<R: BlueprintRepository> BlueprintService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a blueprint from raw input and persists it.
    ///
    /// # Contract
    /// - Fails with `AlreadyExists` when `(author, name)` is taken.
    /// - Fails with `Validation` when `author` or `name` is blank.
    pub fn add_new_blueprint(
        &mut self,
        author: impl Into<String>,
        name: impl Into<String>,
        points: Vec<Point>,
    ) -> RepoResult<()> {
        let blueprint = Blueprint::new(author, name, points);
        self.repo.save(&blueprint)
    }

    /// Lists every stored blueprint. An empty store is not an error.
    pub fn get_all_blueprints(&self) -> RepoResult<Vec<Blueprint>> {
        self.repo.get_all()
    }

    /// Lists the blueprints of one author; `NotFound` when there are none.
    pub fn get_blueprints_by_author(&self, author: &str) -> RepoResult<Vec<Blueprint>> {
        self.repo.get_by_author(author)
    }

    /// Gets one blueprint by natural key.
    pub fn get_blueprint(&self, author: &str, name: &str) -> RepoResult<Blueprint> {
        self.repo.get_one(author, name)
    }

    /// Appends a point to an existing blueprint.
    pub fn add_point(&mut self, author: &str, name: &str, x: i32, y: i32) -> RepoResult<()> {
        self.repo.add_point(author, name, Point::new(x, y))
    }
}
