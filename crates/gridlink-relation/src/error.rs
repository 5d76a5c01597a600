//! Error types for the relation channel.

use thiserror::Error;

use crate::types::{RelationId, UnitId};

/// Result type for relation channel operations.
pub type Result<T> = std::result::Result<T, RelationError>;

/// Errors raised by a relation channel backend.
#[derive(Debug, Error)]
pub enum RelationError {
    /// The relation instance does not exist (never joined, or already
    /// destroyed).
    #[error("relation not found: {0}")]
    RelationNotFound(RelationId),

    /// The unit is not present on the addressed side of the relation.
    #[error("unit not found on relation {relation}: {unit}")]
    UnitNotFound {
        /// Relation that was addressed.
        relation: RelationId,
        /// Unit that was looked up.
        unit: UnitId,
    },
}
