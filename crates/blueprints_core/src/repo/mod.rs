//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the blueprint persistence port.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Blueprint::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to DB transport errors.

pub mod blueprint_repo;
