//! Peer-side publisher for worker-group units.
//!
//! Counterpart of the controller handshake: discovers the controller's
//! coordinates for configless startup, reads the distributed secret, and
//! publishes partition metadata (leader only) and per-unit node inventory.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use gridlink_relation::{RelationChannel, RelationId};

use crate::error::Result;
use crate::facade::Leadership;
use crate::inventory::{ComputeNodeInventory, PartitionInfo};
use crate::keys;

/// Controller coordinates advertised over the relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerCoordinates {
    /// Controller hostname.
    pub host: String,
    /// Controller listen port.
    pub port: u16,
}

/// Publishes a worker group's data onto the relation.
pub struct PeerPublisher {
    channel: Arc<dyn RelationChannel>,
    leadership: Arc<dyn Leadership>,
}

impl PeerPublisher {
    /// Creates a publisher for this unit's view of the relation.
    pub fn new(channel: Arc<dyn RelationChannel>, leadership: Arc<dyn Leadership>) -> Self {
        Self {
            channel,
            leadership,
        }
    }

    /// Generates a partition name when none is configured.
    #[must_use]
    pub fn default_partition_name() -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("compute-{}", &id[..8])
    }

    /// Configless discovery of the controller's advertised coordinates.
    ///
    /// `None` until the controller completes its side of the handshake.
    pub async fn controller_coordinates(
        &self,
        relation: RelationId,
    ) -> Result<Option<ControllerCoordinates>> {
        let host = self
            .channel
            .read_remote_app(relation, keys::CONTROLLER_HOST)
            .await?
            .filter(|value| !value.is_empty());
        let port = self
            .channel
            .read_remote_app(relation, keys::CONTROLLER_PORT)
            .await?
            .filter(|value| !value.is_empty());

        let (Some(host), Some(port)) = (host, port) else {
            return Ok(None);
        };

        match port.parse() {
            Ok(port) => Ok(Some(ControllerCoordinates { host, port })),
            Err(_) => {
                warn!(relation = %relation, port = %port, "unparsable controller port advertised");
                Ok(None)
            }
        }
    }

    /// The distributed auth secret.
    ///
    /// `None` before the handshake completes and after revocation (a
    /// revoked secret reads as empty).
    pub async fn shared_secret(&self, relation: RelationId) -> Result<Option<String>> {
        Ok(self
            .channel
            .read_remote_app(relation, keys::SHARED_SECRET)
            .await?
            .filter(|value| !value.is_empty()))
    }

    /// Publishes the group's partition record into the application bag.
    ///
    /// Application-scope data is group-representative, so only the leader
    /// writes; non-leader calls return `false` without touching the bag.
    pub async fn publish_partition_info(
        &self,
        relation: RelationId,
        info: &PartitionInfo,
    ) -> Result<bool> {
        if !self.leadership.is_leader() {
            debug!(relation = %relation, "not leader, skipping partition info publication");
            return Ok(false);
        }

        let raw = serde_json::to_string(info)?;
        self.channel
            .write_local_app(relation, keys::PARTITION_INFO, &raw)
            .await?;

        info!(
            relation = %relation,
            partition = %info.partition_name,
            "published partition info"
        );
        Ok(true)
    }

    /// Publishes this unit's compute-node inventory.
    ///
    /// Republished whenever the unit's hardware view or membership changes;
    /// the controller folds duplicates with last-write-wins.
    pub async fn publish_inventory(
        &self,
        relation: RelationId,
        node: &ComputeNodeInventory,
    ) -> Result<()> {
        let raw = serde_json::to_string(node)?;
        self.channel
            .write_local_unit(relation, keys::INVENTORY, &raw)
            .await?;

        debug!(relation = %relation, node = %node.node_name, "published node inventory");
        Ok(())
    }
}

impl std::fmt::Debug for PeerPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerPublisher").finish_non_exhaustive()
    }
}
