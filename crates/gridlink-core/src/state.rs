//! Explicit service state carried across handshake transitions.
//!
//! The owning service holds one [`HandshakeState`] and passes it by
//! reference into every reconcile call; the core keeps no ambient mutable
//! state of its own.

use std::collections::HashMap;

use gridlink_relation::RelationId;

/// Provisioning phase of one relation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Relation exists but the secret and coordinates are not yet
    /// published.
    #[default]
    Idle,
    /// Secret and coordinates have been published.
    Provisioned,
    /// Relation torn down and the secret revoked.
    Cleared,
}

/// Mutable handshake state owned by the service.
#[derive(Debug, Clone, Default)]
pub struct HandshakeState {
    phases: HashMap<RelationId, Phase>,
    /// Whether at least one peer group has published usable partition data.
    pub peers_available: bool,
}

impl HandshakeState {
    /// Creates empty state: no relations provisioned, peers unavailable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisioning phase of a relation. Unknown relations are [`Phase::Idle`].
    #[must_use]
    pub fn phase(&self, relation: RelationId) -> Phase {
        self.phases.get(&relation).copied().unwrap_or_default()
    }

    pub(crate) fn set_phase(&mut self, relation: RelationId, phase: Phase) {
        self.phases.insert(relation, phase);
    }
}
