//! In-memory relation backend for embedded hosts and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RelationError, Result};
use crate::traits::RelationChannel;
use crate::types::{AppName, RelationId, Side, UnitId};

#[derive(Debug, Clone)]
struct SideData {
    app: AppName,
    app_bag: HashMap<String, String>,
    units: HashMap<UnitId, HashMap<String, String>>,
}

impl SideData {
    fn new(app: AppName) -> Self {
        Self {
            app,
            app_bag: HashMap::new(),
            units: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct RelationRecord {
    provider: SideData,
    requirer: SideData,
}

impl RelationRecord {
    fn side(&self, side: Side) -> &SideData {
        match side {
            Side::Provider => &self.provider,
            Side::Requirer => &self.requirer,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideData {
        match side {
            Side::Provider => &mut self.provider,
            Side::Requirer => &mut self.requirer,
        }
    }
}

/// In-memory two-sided relation storage.
///
/// Owns the full state of every relation instance and hands out
/// [`MemoryChannel`] participant views over shared storage. Lifecycle
/// control (`join`, `add_unit`, `remove_unit`, `leave`) stands in for the
/// host delivering relation transitions.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelations {
    inner: Arc<RwLock<HashMap<RelationId, RelationRecord>>>,
    next_id: Arc<RwLock<u64>>,
}

impl MemoryRelations {
    /// Creates empty relation storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new relation instance between two application groups.
    pub async fn join(&self, provider_app: AppName, requirer_app: AppName) -> RelationId {
        let id = {
            let mut next = self.next_id.write().await;
            let id = RelationId::new(*next);
            *next += 1;
            id
        };

        self.inner.write().await.insert(
            id,
            RelationRecord {
                provider: SideData::new(provider_app),
                requirer: SideData::new(requirer_app),
            },
        );

        id
    }

    /// Adds a unit to one side of a relation with an empty bag.
    pub async fn add_unit(&self, relation: RelationId, side: Side, unit: UnitId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .get_mut(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;

        record.side_mut(side).units.entry(unit).or_default();
        Ok(())
    }

    /// Removes a unit and its bag from one side of a relation.
    pub async fn remove_unit(&self, relation: RelationId, side: Side, unit: &UnitId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .get_mut(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;

        record
            .side_mut(side)
            .units
            .remove(unit)
            .ok_or_else(|| RelationError::UnitNotFound {
                relation,
                unit: unit.clone(),
            })?;
        Ok(())
    }

    /// Destroys a relation instance and all of its bags.
    pub async fn leave(&self, relation: RelationId) -> Result<()> {
        self.inner
            .write()
            .await
            .remove(&relation)
            .map(|_| ())
            .ok_or(RelationError::RelationNotFound(relation))
    }

    /// Snapshot of one side's application-scope bag, for host inspection.
    pub async fn app_bag(
        &self,
        relation: RelationId,
        side: Side,
    ) -> Result<HashMap<String, String>> {
        let inner = self.inner.read().await;
        let record = inner
            .get(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;
        Ok(record.side(side).app_bag.clone())
    }

    /// Snapshot of one unit's bag, for host inspection.
    pub async fn unit_bag(
        &self,
        relation: RelationId,
        side: Side,
        unit: &UnitId,
    ) -> Result<HashMap<String, String>> {
        let inner = self.inner.read().await;
        let record = inner
            .get(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;
        record
            .side(side)
            .units
            .get(unit)
            .cloned()
            .ok_or_else(|| RelationError::UnitNotFound {
                relation,
                unit: unit.clone(),
            })
    }

    /// Creates a participant view for one unit on one side.
    #[must_use]
    pub fn channel(&self, side: Side, local_unit: UnitId) -> MemoryChannel {
        MemoryChannel {
            inner: self.inner.clone(),
            side,
            local_unit,
        }
    }
}

/// A participant view over [`MemoryRelations`] storage.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    inner: Arc<RwLock<HashMap<RelationId, RelationRecord>>>,
    side: Side,
    local_unit: UnitId,
}

impl MemoryChannel {
    /// The unit this view belongs to.
    #[must_use]
    pub fn local_unit(&self) -> &UnitId {
        &self.local_unit
    }
}

#[async_trait]
impl RelationChannel for MemoryChannel {
    async fn relations(&self) -> Result<Vec<RelationId>> {
        let inner = self.inner.read().await;
        let mut ids: Vec<_> = inner.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn remote_app(&self, relation: RelationId) -> Result<AppName> {
        let inner = self.inner.read().await;
        let record = inner
            .get(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;
        Ok(record.side(self.side.peer()).app.clone())
    }

    async fn remote_units(&self, relation: RelationId) -> Result<Vec<UnitId>> {
        let inner = self.inner.read().await;
        let record = inner
            .get(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;

        let mut units: Vec<_> = record.side(self.side.peer()).units.keys().cloned().collect();
        units.sort();
        Ok(units)
    }

    async fn read_remote_app(&self, relation: RelationId, key: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        let record = inner
            .get(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;
        Ok(record.side(self.side.peer()).app_bag.get(key).cloned())
    }

    async fn read_remote_unit(
        &self,
        relation: RelationId,
        unit: &UnitId,
        key: &str,
    ) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        let record = inner
            .get(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;

        let bag = record
            .side(self.side.peer())
            .units
            .get(unit)
            .ok_or_else(|| RelationError::UnitNotFound {
                relation,
                unit: unit.clone(),
            })?;
        Ok(bag.get(key).cloned())
    }

    async fn write_local_app(&self, relation: RelationId, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .get_mut(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;

        record
            .side_mut(self.side)
            .app_bag
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn write_local_unit(&self, relation: RelationId, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .get_mut(&relation)
            .ok_or(RelationError::RelationNotFound(relation))?;

        // A unit's own bag comes into existence with its first write.
        record
            .side_mut(self.side)
            .units
            .entry(self.local_unit.clone())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
