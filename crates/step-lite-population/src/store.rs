// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance store: identifier -> instance

use rustc_hash::FxHashMap;
use std::sync::Arc;
use step_lite_model::{EntityId, EntityInstance};

/// All instances of one population, keyed by identifier
#[derive(Clone, Debug, Default)]
pub struct InstanceStore {
    instances: FxHashMap<EntityId, Arc<EntityInstance>>,
}

impl InstanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an instance under `id`
    ///
    /// An existing instance with the same identifier is replaced and
    /// returned; the last write wins.
    pub fn insert(
        &mut self,
        id: EntityId,
        instance: EntityInstance,
    ) -> Option<Arc<EntityInstance>> {
        self.instances.insert(id, Arc::new(instance))
    }

    /// Get instance by identifier
    pub fn get(&self, id: EntityId) -> Option<&Arc<EntityInstance>> {
        self.instances.get(&id)
    }

    /// Check if an identifier is taken
    pub fn contains(&self, id: EntityId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterate over instances in arbitrary order
    pub fn values(&self) -> impl Iterator<Item = &Arc<EntityInstance>> {
        self.instances.values()
    }

    /// All identifiers, ascending
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.instances.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_lite_model::EntityDefinition;

    #[test]
    fn test_last_write_wins() {
        let wall = Arc::new(EntityDefinition::new("Wall", true));
        let slab = Arc::new(EntityDefinition::new("Slab", true));
        let mut store = InstanceStore::new();

        assert!(store.insert(EntityId(7), EntityInstance::new(EntityId(7), wall)).is_none());
        let replaced = store.insert(EntityId(7), EntityInstance::new(EntityId(7), slab)).unwrap();

        assert_eq!(replaced.type_name(), "Wall");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(EntityId(7)).unwrap().type_name(), "Slab");
    }

    #[test]
    fn test_ids_sorted() {
        let wall = Arc::new(EntityDefinition::new("Wall", true));
        let mut store = InstanceStore::new();
        for id in [30, 4, 12] {
            store.insert(EntityId(id), EntityInstance::new(EntityId(id), wall.clone()));
        }

        assert_eq!(store.ids(), [EntityId(4), EntityId(12), EntityId(30)]);
        assert!(store.contains(EntityId(12)));
        assert!(!store.contains(EntityId(5)));
        assert!(store.get(EntityId(5)).is_none());
    }
}
