//! Gridlink controller core - relation handshake and inventory aggregation.
//!
//! The cluster controller coordinates a dynamic set of compute worker-group
//! peers over a two-scope key-value relation channel:
//!
//! - **Handshake**: once the controller software is installed and its
//!   accounting dependency is ready, publish the shared auth secret and the
//!   controller's coordinates so peers can start in configless mode
//! - **Readiness**: watch for peer-published partition metadata and raise
//!   `Available` / `Unavailable` notifications
//! - **Aggregation**: fold per-unit compute-node inventory into a
//!   deduplicated partition list for scheduler configuration
//!
//! Lifecycle handling is an explicit reconciliation API: the host delivers
//! one [`Transition`] at a time and the reconciler returns an [`Outcome`]
//! that either completes or asks for the transition to be requeued.
//! Deferral is therefore at-least-once per relation, and every handler is
//! safe to re-run from scratch.
//!
//! # Example
//!
//! ```ignore
//! let reconciler = HandshakeReconciler::new(channel, controller, leadership, config);
//! let mut state = HandshakeState::new();
//!
//! let outcome = reconciler.reconcile(&mut state, Transition::Joined(rel)).await?;
//! bus.publish_all(outcome.notifications.iter().copied());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod facade;
pub mod handshake;
pub mod inventory;
pub mod keys;
pub mod peer;
pub mod state;

pub use config::HandshakeConfig;
pub use error::{CoreError, Result};
pub use events::{EventBus, Notification};
pub use facade::{ControllerFacade, Leadership, StaticLeadership};
pub use handshake::{Disposition, HandshakeReconciler, Outcome, Transition};
pub use inventory::{
    aggregate, dedup_partitions, AggregatedPartition, ComputeNodeInventory, PartitionInfo,
};
pub use peer::{ControllerCoordinates, PeerPublisher};
pub use state::{HandshakeState, Phase};
