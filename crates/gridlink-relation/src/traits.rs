use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AppName, RelationId, UnitId};

/// One participant's view of a relation endpoint.
///
/// A relation connects two application groups, each side exposing a
/// key-value bag at application scope and one per unit. A view is held by a
/// specific unit on a specific side: reads address the remote side, writes
/// address the participant's own bags.
///
/// Application-scope writes are group-representative and must only be
/// performed by the unit holding leadership; that policy is enforced by the
/// caller, not the channel.
#[async_trait]
pub trait RelationChannel: Send + Sync {
    /// Lists the currently connected relation instances for this endpoint.
    async fn relations(&self) -> Result<Vec<RelationId>>;

    /// Resolves the application name on the remote side of a relation.
    async fn remote_app(&self, relation: RelationId) -> Result<AppName>;

    /// Lists the units currently present on the remote side of a relation.
    async fn remote_units(&self, relation: RelationId) -> Result<Vec<UnitId>>;

    /// Reads a key from the remote application-scope bag.
    async fn read_remote_app(&self, relation: RelationId, key: &str) -> Result<Option<String>>;

    /// Reads a key from a remote unit's bag.
    async fn read_remote_unit(
        &self,
        relation: RelationId,
        unit: &UnitId,
        key: &str,
    ) -> Result<Option<String>>;

    /// Writes a key into the local application-scope bag.
    ///
    /// Overwrites are idempotent; re-running a handler that writes the same
    /// key is safe.
    async fn write_local_app(&self, relation: RelationId, key: &str, value: &str) -> Result<()>;

    /// Writes a key into this unit's own bag.
    async fn write_local_unit(&self, relation: RelationId, key: &str, value: &str) -> Result<()>;
}
