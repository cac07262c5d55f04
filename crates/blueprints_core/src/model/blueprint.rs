//! Blueprint domain model.
//!
//! # Responsibility
//! - Define the `Blueprint` aggregate and its `Point` values.
//! - Validate the natural key before it reaches storage.
//!
//! # Invariants
//! - `author` and `name` are never blank.
//! - `points` keeps the drawing order; appends only ever go to the end.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Integer coordinate pair owned by exactly one blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Named, author-owned ordered sequence of points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub author: String,
    pub name: String,
    /// Drawn path, in insertion order.
    #[serde(default)]
    pub points: Vec<Point>,
}

/// Validation failures for blueprint natural keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintValidationError {
    BlankAuthor,
    BlankName,
}

impl BlueprintValidationError {
    /// Returns the offending field name as exposed to API callers.
    pub fn field(self) -> &'static str {
        match self {
            Self::BlankAuthor => "author",
            Self::BlankName => "name",
        }
    }
}

impl Display for BlueprintValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: must not be blank", self.field())
    }
}

impl Error for BlueprintValidationError {}

impl Blueprint {
    /// Creates a blueprint without validating it.
    ///
    /// Repository write paths call [`Blueprint::validate`] before persisting.
    pub fn new(author: impl Into<String>, name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            author: author.into(),
            name: name.into(),
            points,
        }
    }

    /// Checks natural-key invariants.
    ///
    /// Returns the first violation; use [`Blueprint::violations`] to collect
    /// all of them.
    pub fn validate(&self) -> Result<(), BlueprintValidationError> {
        match self.violations().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns every natural-key violation, in field declaration order.
    pub fn violations(&self) -> Vec<BlueprintValidationError> {
        let mut errors = Vec::new();
        if self.author.trim().is_empty() {
            errors.push(BlueprintValidationError::BlankAuthor);
        }
        if self.name.trim().is_empty() {
            errors.push(BlueprintValidationError::BlankName);
        }
        errors
    }

    /// Appends a point at the end of the drawn path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }
}
