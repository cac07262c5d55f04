//! Core domain logic for the blueprints service.
//! This crate is the single source of truth for blueprint invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::blueprint::{Blueprint, BlueprintValidationError, Point};
pub use repo::blueprint_repo::{
    BlueprintRepository, RepoError, RepoResult, SqliteBlueprintRepository,
};
pub use service::blueprint_service::BlueprintService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
