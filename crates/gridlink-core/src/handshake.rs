//! Relation handshake reconciler.
//!
//! Drives secret publication and availability signalling from relation
//! lifecycle transitions. A transition that cannot complete yet is not an
//! error: it comes back as a [`Disposition::Requeue`] and the host
//! redelivers it later, at least once, preserving per-relation order.
//! Handlers are safe to re-run from scratch; every write is an idempotent
//! key overwrite.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use gridlink_relation::{RelationChannel, RelationError, RelationId};

use crate::config::HandshakeConfig;
use crate::error::Result;
use crate::events::Notification;
use crate::facade::{ControllerFacade, Leadership};
use crate::inventory::{self, AggregatedPartition};
use crate::keys;
use crate::state::{HandshakeState, Phase};

/// Relation lifecycle transition delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A peer group joined the relation.
    Joined(RelationId),
    /// Peer relation data changed.
    Changed(RelationId),
    /// A peer unit departed the relation.
    Departed(RelationId),
    /// The peer group left and the relation is being torn down.
    Left(RelationId),
}

impl Transition {
    /// The relation this transition concerns.
    #[must_use]
    pub const fn relation(self) -> RelationId {
        match self {
            Self::Joined(id) | Self::Changed(id) | Self::Departed(id) | Self::Left(id) => id,
        }
    }
}

/// How the host should treat a finished reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The transition is fully handled.
    Completed,
    /// A precondition or expected datum was missing; redeliver the same
    /// transition unchanged after the requeue delay.
    Requeue,
}

/// Result of one reconcile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Completed or requeue.
    pub disposition: Disposition,
    /// Redelivery delay, set when the disposition is requeue.
    pub requeue_after: Option<Duration>,
    /// Notifications for the owning service to publish.
    pub notifications: Vec<Notification>,
}

impl Outcome {
    fn completed() -> Self {
        Self {
            disposition: Disposition::Completed,
            requeue_after: None,
            notifications: Vec::new(),
        }
    }

    fn completed_with(notification: Notification) -> Self {
        Self {
            disposition: Disposition::Completed,
            requeue_after: None,
            notifications: vec![notification],
        }
    }

    fn requeue(after: Duration) -> Self {
        Self {
            disposition: Disposition::Requeue,
            requeue_after: Some(after),
            notifications: Vec::new(),
        }
    }

    /// True when the host should redeliver the transition.
    #[must_use]
    pub fn is_requeue(&self) -> bool {
        self.disposition == Disposition::Requeue
    }
}

/// Controller-side handshake state machine.
///
/// Holds only collaborators and configuration; all mutable state lives in
/// the [`HandshakeState`] the caller passes into [`reconcile`].
///
/// [`reconcile`]: HandshakeReconciler::reconcile
pub struct HandshakeReconciler {
    channel: Arc<dyn RelationChannel>,
    controller: Arc<dyn ControllerFacade>,
    leadership: Arc<dyn Leadership>,
    config: HandshakeConfig,
}

impl HandshakeReconciler {
    /// Creates a reconciler over the given collaborators.
    pub fn new(
        channel: Arc<dyn RelationChannel>,
        controller: Arc<dyn ControllerFacade>,
        leadership: Arc<dyn Leadership>,
        config: HandshakeConfig,
    ) -> Self {
        debug!(endpoint = %config.endpoint, "handshake reconciler created");
        Self {
            channel,
            controller,
            leadership,
            config,
        }
    }

    /// Processes one lifecycle transition against the service state.
    pub async fn reconcile(
        &self,
        state: &mut HandshakeState,
        transition: Transition,
    ) -> Result<Outcome> {
        match transition {
            Transition::Joined(relation) => self.on_joined(state, relation).await,
            Transition::Changed(relation) | Transition::Departed(relation) => {
                self.on_changed(state, relation).await
            }
            Transition::Left(relation) => self.on_left(state, relation).await,
        }
    }

    /// Publishes the shared secret and controller coordinates once both
    /// prerequisites hold; requeues otherwise without touching the bag.
    async fn on_joined(&self, state: &mut HandshakeState, relation: RelationId) -> Result<Outcome> {
        if !self.controller.is_installed() {
            debug!(relation = %relation, "controller not installed, requeueing join");
            return Ok(Outcome::requeue(self.config.requeue_delay));
        }

        if !self.controller.dependency_ready() {
            debug!(relation = %relation, "accounting service not ready, requeueing join");
            return Ok(Outcome::requeue(self.config.requeue_delay));
        }

        self.channel
            .write_local_app(relation, keys::SHARED_SECRET, &self.controller.shared_secret())
            .await?;
        self.channel
            .write_local_app(relation, keys::CONTROLLER_HOST, &self.controller.hostname())
            .await?;
        self.channel
            .write_local_app(
                relation,
                keys::CONTROLLER_PORT,
                &self.controller.port().to_string(),
            )
            .await?;

        state.set_phase(relation, Phase::Provisioned);
        info!(
            relation = %relation,
            host = %self.controller.hostname(),
            "published shared secret and controller coordinates"
        );
        Ok(Outcome::completed())
    }

    /// Marks peers available once the peer application has published
    /// partition metadata; requeues until it appears.
    async fn on_changed(
        &self,
        state: &mut HandshakeState,
        relation: RelationId,
    ) -> Result<Outcome> {
        let info = self
            .channel
            .read_remote_app(relation, keys::PARTITION_INFO)
            .await?
            .filter(|value| !value.is_empty());

        if info.is_none() {
            debug!(relation = %relation, "no partition info published yet, requeueing");
            return Ok(Outcome::requeue(self.config.requeue_delay));
        }

        state.peers_available = true;
        debug!(relation = %relation, "peer partition info present");
        Ok(Outcome::completed_with(Notification::Available))
    }

    /// Revokes the shared secret (leader only) and marks peers unavailable.
    async fn on_left(&self, state: &mut HandshakeState, relation: RelationId) -> Result<Outcome> {
        if self.leadership.is_leader() {
            // Logical revocation: overwrite rather than delete, so peers
            // observing the bag see the token go empty.
            match self
                .channel
                .write_local_app(relation, keys::SHARED_SECRET, "")
                .await
            {
                Ok(()) => info!(relation = %relation, "shared secret revoked"),
                Err(RelationError::RelationNotFound(_)) => {
                    debug!(relation = %relation, "relation already destroyed, nothing to revoke");
                }
                Err(other) => return Err(other.into()),
            }
        }

        state.peers_available = false;
        state.set_phase(relation, Phase::Cleared);
        info!(relation = %relation, "peer relation torn down");
        Ok(Outcome::completed_with(Notification::Unavailable))
    }

    /// Number of currently connected peer relations.
    pub async fn relation_count(&self) -> Result<usize> {
        Ok(self.channel.relations().await?.len())
    }

    /// True when at least one peer group is connected.
    pub async fn is_joined(&self) -> Result<bool> {
        Ok(self.relation_count().await? > 0)
    }

    /// Current deduplicated partition view across all peer relations.
    pub async fn partitions(&self) -> Result<Vec<AggregatedPartition>> {
        inventory::aggregate(self.channel.as_ref()).await
    }
}

impl std::fmt::Debug for HandshakeReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeReconciler")
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::StaticLeadership;
    use gridlink_relation::{AppName, MemoryRelations, Side, UnitId};

    struct TestController {
        installed: bool,
        ready: bool,
    }

    impl ControllerFacade for TestController {
        fn is_installed(&self) -> bool {
            self.installed
        }
        fn dependency_ready(&self) -> bool {
            self.ready
        }
        fn shared_secret(&self) -> String {
            "test-secret".to_owned()
        }
        fn hostname(&self) -> String {
            "ctl-0.example".to_owned()
        }
        fn port(&self) -> u16 {
            6817
        }
    }

    fn reconciler(
        relations: &MemoryRelations,
        installed: bool,
        ready: bool,
        leader: bool,
    ) -> HandshakeReconciler {
        HandshakeReconciler::new(
            Arc::new(relations.channel(Side::Provider, UnitId::new("controller/0"))),
            Arc::new(TestController { installed, ready }),
            Arc::new(StaticLeadership(leader)),
            HandshakeConfig::default(),
        )
    }

    async fn join(relations: &MemoryRelations) -> RelationId {
        relations
            .join(AppName::new("controller"), AppName::new("compute"))
            .await
    }

    #[tokio::test]
    async fn joined_requeues_when_not_installed() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let reconciler = reconciler(&relations, false, true, true);
        let mut state = HandshakeState::new();

        let outcome = reconciler
            .reconcile(&mut state, Transition::Joined(rel))
            .await
            .unwrap();

        assert!(outcome.is_requeue());
        assert_eq!(outcome.requeue_after, Some(Duration::from_secs(5)));
        assert!(relations.app_bag(rel, Side::Provider).await.unwrap().is_empty());
        assert_eq!(state.phase(rel), Phase::Idle);
    }

    #[tokio::test]
    async fn joined_requeues_when_dependency_not_ready() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let reconciler = reconciler(&relations, true, false, true);
        let mut state = HandshakeState::new();

        let outcome = reconciler
            .reconcile(&mut state, Transition::Joined(rel))
            .await
            .unwrap();

        assert!(outcome.is_requeue());
        assert!(relations.app_bag(rel, Side::Provider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn joined_writes_exactly_three_keys() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let reconciler = reconciler(&relations, true, true, true);
        let mut state = HandshakeState::new();

        let outcome = reconciler
            .reconcile(&mut state, Transition::Joined(rel))
            .await
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::Completed);
        assert!(outcome.notifications.is_empty());
        assert_eq!(state.phase(rel), Phase::Provisioned);

        let bag = relations.app_bag(rel, Side::Provider).await.unwrap();
        assert_eq!(bag.len(), 3);
        assert_eq!(bag.get(keys::SHARED_SECRET).map(String::as_str), Some("test-secret"));
        assert_eq!(bag.get(keys::CONTROLLER_HOST).map(String::as_str), Some("ctl-0.example"));
        assert_eq!(bag.get(keys::CONTROLLER_PORT).map(String::as_str), Some("6817"));
    }

    #[tokio::test]
    async fn changed_requeues_without_partition_info() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let reconciler = reconciler(&relations, true, true, true);
        let mut state = HandshakeState::new();

        let outcome = reconciler
            .reconcile(&mut state, Transition::Changed(rel))
            .await
            .unwrap();

        assert!(outcome.is_requeue());
        assert!(outcome.notifications.is_empty());
        assert!(!state.peers_available);
    }

    #[tokio::test]
    async fn changed_is_reentrant_while_data_present() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let peer = relations.channel(Side::Requirer, UnitId::new("compute/0"));
        peer.write_local_app(rel, keys::PARTITION_INFO, r#"{"partition_name":"compute"}"#)
            .await
            .unwrap();

        let reconciler = reconciler(&relations, true, true, true);
        let mut state = HandshakeState::new();

        for _ in 0..3 {
            let outcome = reconciler
                .reconcile(&mut state, Transition::Changed(rel))
                .await
                .unwrap();
            assert_eq!(outcome.disposition, Disposition::Completed);
            assert_eq!(outcome.notifications, vec![Notification::Available]);
            assert!(state.peers_available);
        }
    }

    #[tokio::test]
    async fn departed_uses_the_changed_handler() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let peer = relations.channel(Side::Requirer, UnitId::new("compute/0"));
        peer.write_local_app(rel, keys::PARTITION_INFO, r#"{"partition_name":"compute"}"#)
            .await
            .unwrap();

        let reconciler = reconciler(&relations, true, true, true);
        let mut state = HandshakeState::new();

        let outcome = reconciler
            .reconcile(&mut state, Transition::Departed(rel))
            .await
            .unwrap();

        assert_eq!(outcome.notifications, vec![Notification::Available]);
    }

    #[tokio::test]
    async fn left_revokes_secret_only_as_leader() {
        for leader in [true, false] {
            let relations = MemoryRelations::new();
            let rel = join(&relations).await;
            let reconciler = reconciler(&relations, true, true, leader);
            let mut state = HandshakeState::new();

            reconciler
                .reconcile(&mut state, Transition::Joined(rel))
                .await
                .unwrap();
            let outcome = reconciler
                .reconcile(&mut state, Transition::Left(rel))
                .await
                .unwrap();

            assert_eq!(outcome.notifications, vec![Notification::Unavailable]);
            assert!(!state.peers_available);
            assert_eq!(state.phase(rel), Phase::Cleared);

            let bag = relations.app_bag(rel, Side::Provider).await.unwrap();
            let expected = if leader { "" } else { "test-secret" };
            assert_eq!(bag.get(keys::SHARED_SECRET).map(String::as_str), Some(expected));
        }
    }

    #[tokio::test]
    async fn left_tolerates_destroyed_relation() {
        let relations = MemoryRelations::new();
        let rel = join(&relations).await;
        let reconciler = reconciler(&relations, true, true, true);
        let mut state = HandshakeState::new();

        relations.leave(rel).await.unwrap();

        let outcome = reconciler
            .reconcile(&mut state, Transition::Left(rel))
            .await
            .unwrap();

        assert_eq!(outcome.notifications, vec![Notification::Unavailable]);
        assert!(!state.peers_available);
    }

    #[tokio::test]
    async fn is_joined_tracks_relation_count() {
        let relations = MemoryRelations::new();
        let reconciler = reconciler(&relations, true, true, true);

        assert!(!reconciler.is_joined().await.unwrap());
        let rel = join(&relations).await;
        assert!(reconciler.is_joined().await.unwrap());
        assert_eq!(reconciler.relation_count().await.unwrap(), 1);

        relations.leave(rel).await.unwrap();
        assert!(!reconciler.is_joined().await.unwrap());
    }

    #[test]
    fn transition_relation_accessor() {
        let rel = RelationId::new(4);
        assert_eq!(Transition::Joined(rel).relation(), rel);
        assert_eq!(Transition::Left(rel).relation(), rel);
    }
}
