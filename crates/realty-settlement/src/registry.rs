//! Property registry: pool slots keyed by property id.
//!
//! Each property id owns one [`PoolSlot`] behind its own mutex, so
//! operations on different properties run in parallel while operations on
//! one property are serialized. The outer map is only locked long enough
//! to find or insert a slot.

use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, RwLock};
use realty_types::{Generation, PoolPhase, PropertyId, PropertyPool, RealtyError, Result};

use crate::ledger::PoolGeneration;

/// Current generation of a property plus every archived one.
#[derive(Debug, Default)]
pub struct PoolSlot {
    current: Option<PoolGeneration>,
    history: Vec<PoolGeneration>,
}

impl PoolSlot {
    #[must_use]
    pub fn current(&self) -> Option<&PoolGeneration> {
        self.current.as_ref()
    }

    /// The live generation.
    ///
    /// # Errors
    /// `PropertyNotFound` if no pool was ever installed in this slot.
    pub fn live(&self, id: &PropertyId) -> Result<&PoolGeneration> {
        self.current
            .as_ref()
            .ok_or_else(|| RealtyError::PropertyNotFound(id.clone()))
    }

    /// Mutable access to the live generation.
    ///
    /// # Errors
    /// `PropertyNotFound` if no pool was ever installed in this slot.
    pub fn live_mut(&mut self, id: &PropertyId) -> Result<&mut PoolGeneration> {
        self.current
            .as_mut()
            .ok_or_else(|| RealtyError::PropertyNotFound(id.clone()))
    }

    /// Check that a new generation may be installed.
    ///
    /// # Errors
    /// `DuplicateProperty` while the current generation is not fully settled.
    pub fn check_vacant(&self, id: &PropertyId) -> Result<()> {
        match &self.current {
            Some(generation) if generation.pool.phase != PoolPhase::FullySettled => {
                Err(RealtyError::DuplicateProperty(id.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Generation number the next installed pool will carry.
    #[must_use]
    pub fn next_generation(&self) -> Generation {
        self.current
            .as_ref()
            .map_or(Generation::FIRST, |g| g.pool.generation.next())
    }

    /// Install a new generation, archiving the previous one.
    pub fn install(&mut self, pool: PropertyPool) {
        if let Some(previous) = self.current.replace(PoolGeneration::new(pool)) {
            self.history.push(previous);
        }
    }

    /// Archived generations, oldest first.
    #[must_use]
    pub fn history(&self) -> &[PoolGeneration] {
        &self.history
    }

    /// Whether no generation was ever installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.history.is_empty()
    }
}

/// All pool slots.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    slots: RwLock<HashMap<PropertyId, Arc<Mutex<PoolSlot>>>>,
}

impl PropertyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `id`, creating an empty one if needed.
    pub fn slot_or_insert(&self, id: &PropertyId) -> Arc<Mutex<PoolSlot>> {
        if let Some(slot) = self.slots.read().get(id) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry(id.clone()).or_default())
    }

    /// Drop the slot for `id` if nothing was ever installed in it and no
    /// caller still holds it. Undoes [`Self::slot_or_insert`] after a
    /// failed create.
    pub fn discard_if_empty(&self, id: &PropertyId) {
        let mut slots = self.slots.write();
        // Clones are only handed out under the map lock, so a count of one
        // means no other caller can reach this slot.
        let unused = slots
            .get(id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1 && slot.lock().is_empty());
        if unused {
            slots.remove(id);
        }
    }

    /// Slot for an existing property.
    ///
    /// # Errors
    /// `PropertyNotFound` if the id was never created.
    pub fn slot(&self, id: &PropertyId) -> Result<Arc<Mutex<PoolSlot>>> {
        self.slots
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RealtyError::PropertyNotFound(id.clone()))
    }

    /// Current generation of `id`.
    ///
    /// # Errors
    /// `PropertyNotFound` if the id has no pool.
    pub fn get_pool(&self, id: &PropertyId) -> Result<PropertyPool> {
        let slot = self.slot(id)?;
        let slot = slot.lock();
        Ok(slot.live(id)?.pool.clone())
    }

    /// Every property id with a pool, sorted.
    #[must_use]
    pub fn list_pool_ids(&self) -> Vec<PropertyId> {
        let slots = self.slots.read();
        let mut ids: Vec<PropertyId> = slots
            .iter()
            .filter(|(_, slot)| slot.lock().current().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Archived generations of `id`, oldest first.
    ///
    /// # Errors
    /// `PropertyNotFound` if the id was never created.
    pub fn pool_history(&self, id: &PropertyId) -> Result<Vec<PropertyPool>> {
        let slot = self.slot(id)?;
        let slot = slot.lock();
        Ok(slot.history().iter().map(|g| g.pool.clone()).collect())
    }

    /// Number of properties with a pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list_pool_ids().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
