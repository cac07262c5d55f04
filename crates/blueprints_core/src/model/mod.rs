//! Domain model for blueprints and their points.
//!
//! # Responsibility
//! - Define the values exchanged between service, repository and HTTP layers.
//! - Keep the model free of storage-specific identifiers.
//!
//! # Invariants
//! - A blueprint is identified by its `(author, name)` natural key.
//! - Point order inside a blueprint is significant.

pub mod blueprint;
