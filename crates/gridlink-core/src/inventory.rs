//! Partition and compute-node inventory aggregation.
//!
//! Aggregation is best-effort: peers may republish stale or overlapping
//! unit data during membership churn (scale-down races, restarts), so
//! duplicate node entries fold silently with last-write-wins instead of
//! erroring. Partition construction for the scheduler always succeeds with
//! whatever data is currently published.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use gridlink_relation::{RelationChannel, RelationId};

use crate::error::{CoreError, Result};
use crate::keys;

/// Static partition metadata, published once per peer application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    /// Partition name, unique per peer group.
    pub partition_name: String,
    /// Extra scheduler configuration for the partition.
    #[serde(default)]
    pub partition_config: String,
    /// Administrative state (e.g. `UP`, `DOWN`, `DRAIN`).
    #[serde(default)]
    pub partition_state: String,
}

/// Compute-node descriptor published by each peer unit, keyed by
/// `node_name`. Republished whenever the unit's membership changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeNodeInventory {
    /// Node name, unique within a partition after aggregation.
    pub node_name: String,
    /// Node network address.
    pub node_addr: String,
    /// Usable memory in MiB.
    #[serde(default)]
    pub real_memory: u64,
    /// Total logical CPUs.
    #[serde(default)]
    pub cpus: u32,
    /// Threads per physical core.
    #[serde(default = "one")]
    pub threads_per_core: u32,
    /// Cores per socket.
    #[serde(default = "one")]
    pub cores_per_socket: u32,
    /// Sockets per board.
    #[serde(default = "one")]
    pub sockets_per_board: u32,
    /// Generic resources (GPUs etc.).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gres: Vec<String>,
}

const fn one() -> u32 {
    1
}

/// A partition joined with the inventory of every reporting peer unit.
///
/// Transient: recomputed on every query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedPartition {
    /// Partition metadata as published by the peer application.
    #[serde(flatten)]
    pub info: PartitionInfo,
    /// Deduplicated node inventory across the peer group's units.
    pub inventory: Vec<ComputeNodeInventory>,
}

/// Materializes the current partition view from all connected peer
/// relations.
///
/// Relations whose peer has not published `partition_info` yet are skipped:
/// a peer group that has not published is simply not a partition yet.
/// Payloads that are present but unparsable fail the whole query.
pub async fn aggregate(channel: &dyn RelationChannel) -> Result<Vec<AggregatedPartition>> {
    let mut partitions = Vec::new();

    for relation in channel.relations().await? {
        let raw = channel
            .read_remote_app(relation, keys::PARTITION_INFO)
            .await?
            .filter(|value| !value.is_empty());

        let Some(raw) = raw else {
            warn!(relation = %relation, "peer has not published partition info, skipping");
            continue;
        };

        let info: PartitionInfo = parse(relation, keys::PARTITION_INFO, &raw)?;

        let mut inventory = Vec::new();
        for unit in channel.remote_units(relation).await? {
            let Some(raw) = channel
                .read_remote_unit(relation, &unit, keys::INVENTORY)
                .await?
                .filter(|value| !value.is_empty())
            else {
                continue;
            };
            inventory.push(parse(relation, keys::INVENTORY, &raw)?);
        }

        partitions.push(AggregatedPartition { info, inventory });
    }

    Ok(dedup_partitions(partitions))
}

/// Folds duplicate `node_name` entries out of each partition's inventory.
///
/// Last write wins; relative partition order is preserved; the surviving
/// entry keeps the position where its name was first seen, which makes the
/// fold idempotent.
#[must_use]
pub fn dedup_partitions(partitions: Vec<AggregatedPartition>) -> Vec<AggregatedPartition> {
    partitions
        .into_iter()
        .map(|mut partition| {
            let mut index: HashMap<String, usize> = HashMap::new();
            let mut unique: Vec<ComputeNodeInventory> = Vec::new();

            for node in partition.inventory.drain(..) {
                match index.get(&node.node_name) {
                    Some(&at) => unique[at] = node,
                    None => {
                        index.insert(node.node_name.clone(), unique.len());
                        unique.push(node);
                    }
                }
            }

            partition.inventory = unique;
            partition
        })
        .collect()
}

fn parse<T: DeserializeOwned>(relation: RelationId, key: &'static str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| {
        error!(relation = %relation, key, error = %source, "malformed relation payload");
        CoreError::MalformedPayload {
            relation,
            key,
            source,
        }
    })
}
