//! Test fixtures for handshake and aggregation integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gridlink_core::{
    ComputeNodeInventory, ControllerFacade, HandshakeConfig, HandshakeReconciler, PartitionInfo,
    PeerPublisher, StaticLeadership,
};
use gridlink_relation::{AppName, MemoryRelations, RelationId, Side, UnitId};

/// Controller facade double with toggleable prerequisites.
pub struct TestController {
    installed: AtomicBool,
    ready: AtomicBool,
}

impl TestController {
    /// Creates a controller with both prerequisites unmet.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            installed: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        })
    }

    /// Creates a controller with both prerequisites met.
    pub fn ready() -> Arc<Self> {
        let controller = Self::new();
        controller.set_installed(true);
        controller.set_ready(true);
        controller
    }

    /// Flips the installed flag.
    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }

    /// Flips the dependency-ready flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl ControllerFacade for TestController {
    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn dependency_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn shared_secret(&self) -> String {
        "integration-secret".to_owned()
    }

    fn hostname(&self) -> String {
        "ctl-0.example".to_owned()
    }

    fn port(&self) -> u16 {
        6817
    }
}

/// A controller plus relation storage wired for integration tests.
pub struct Cluster {
    pub relations: MemoryRelations,
    pub controller: Arc<TestController>,
    pub reconciler: HandshakeReconciler,
}

impl Cluster {
    /// Builds a cluster whose controller leads and has all prerequisites
    /// met.
    pub fn ready() -> Self {
        Self::new(TestController::ready(), true)
    }

    /// Builds a cluster with explicit controller and leadership.
    pub fn new(controller: Arc<TestController>, leader: bool) -> Self {
        let relations = MemoryRelations::new();
        let reconciler = HandshakeReconciler::new(
            Arc::new(relations.channel(Side::Provider, UnitId::new("controller/0"))),
            controller.clone(),
            Arc::new(StaticLeadership(leader)),
            HandshakeConfig::default(),
        );

        Self {
            relations,
            controller,
            reconciler,
        }
    }

    /// Joins a peer group and returns the new relation.
    pub async fn join_peer_group(&self, app: &str) -> RelationId {
        self.relations
            .join(AppName::new("controller"), AppName::new(app))
            .await
    }

    /// Creates a peer-side publisher for one unit; the first unit of a
    /// group is its leader.
    pub fn peer(&self, unit: &str, leader: bool) -> PeerPublisher {
        PeerPublisher::new(
            Arc::new(self.relations.channel(Side::Requirer, UnitId::new(unit))),
            Arc::new(StaticLeadership(leader)),
        )
    }

    /// Adds a peer unit to the requirer side of a relation.
    pub async fn add_peer_unit(&self, relation: RelationId, unit: &str) {
        self.relations
            .add_unit(relation, Side::Requirer, UnitId::new(unit))
            .await
            .unwrap();
    }
}

/// Creates a partition record with the given name.
pub fn partition(name: &str) -> PartitionInfo {
    PartitionInfo {
        partition_name: name.to_owned(),
        partition_config: String::new(),
        partition_state: "UP".to_owned(),
    }
}

/// Creates a node descriptor with the given name and address.
pub fn node(name: &str, addr: &str) -> ComputeNodeInventory {
    ComputeNodeInventory {
        node_name: name.to_owned(),
        node_addr: addr.to_owned(),
        real_memory: 16_384,
        cpus: 8,
        threads_per_core: 2,
        cores_per_socket: 4,
        sockets_per_board: 1,
        gres: Vec::new(),
    }
}
