//! Gridlink relation channel - two-scope key-value relations between peer
//! application groups.
//!
//! A relation is a bidirectional named channel connecting two application
//! groups. Each side exposes a key-value bag at application scope (written
//! by the group's leader) and one bag per unit. Participants hold a
//! [`RelationChannel`] view scoped to their side and unit: reads address
//! the remote side, writes address their own bags.
//!
//! The [`MemoryRelations`] backend keeps both sides of every relation in
//! process memory and is used by embedded hosts and tests.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RelationError, Result};
pub use memory::{MemoryChannel, MemoryRelations};
pub use traits::RelationChannel;
pub use types::{AppName, RelationId, Side, UnitId};
