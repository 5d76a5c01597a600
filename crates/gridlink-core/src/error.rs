//! Error types for the controller core.
//!
//! Missing prerequisites and absent relation data are deliberately not
//! errors; they surface as a requeue disposition on the reconcile outcome.
//! Only channel failures and unparsable payloads reach this type.

use gridlink_relation::{RelationError, RelationId};
use thiserror::Error;

/// Result type for controller core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the controller core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Relation channel failure.
    #[error("relation error: {0}")]
    Relation(#[from] RelationError),

    /// A serialized payload was present but unparsable. Fatal to the
    /// transition or query that observed it; requires operator
    /// intervention on the publishing peer.
    #[error("malformed {key} payload on relation {relation}: {source}")]
    MalformedPayload {
        /// Relation carrying the payload.
        relation: RelationId,
        /// Data key the payload was read from.
        key: &'static str,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Serialization of an outgoing payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
