// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type index: exact type name -> instances
//!
//! A `TypeIndex` is an immutable snapshot of an [`InstanceStore`]. It groups
//! instances by the canonical name of their own entity definition, never by
//! an ancestor, and does not follow later changes to the store.

use crate::InstanceStore;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use step_lite_model::EntityInstance;

/// Instances grouped by exact (uppercase) type name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeIndex {
    by_type: FxHashMap<String, Vec<Arc<EntityInstance>>>,
    instance_count: usize,
}

impl TypeIndex {
    /// Build a snapshot of `store`
    ///
    /// Each group is ordered by ascending identifier, so building twice from
    /// the same store yields identical groups.
    pub fn build(store: &InstanceStore) -> Self {
        let mut by_type: FxHashMap<String, Vec<Arc<EntityInstance>>> = FxHashMap::default();
        for instance in store.values() {
            by_type
                .entry(instance.type_key().to_string())
                .or_default()
                .push(Arc::clone(instance));
        }
        for group in by_type.values_mut() {
            group.sort_by_key(|instance| instance.id);
        }

        log::debug!(
            "Indexed {} instances under {} types",
            store.len(),
            by_type.len()
        );

        Self {
            by_type,
            instance_count: store.len(),
        }
    }

    /// Instances whose exact type is `type_name` (case-insensitive)
    ///
    /// Empty for names with no instances, including names the schema does
    /// not know.
    pub fn exact(&self, type_name: &str) -> &[Arc<EntityInstance>] {
        self.by_type
            .get(type_name)
            .or_else(|| self.by_type.get(&type_name.to_ascii_uppercase()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of instances of exactly `type_name`
    pub fn count(&self, type_name: &str) -> usize {
        self.exact(type_name).len()
    }

    /// Populated type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// `(type name, count)` for every populated type, sorted by name
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.type_names()
            .into_iter()
            .map(|name| (name, self.count(name)))
            .collect()
    }

    /// Number of indexed instances
    pub fn len(&self) -> usize {
        self.instance_count
    }

    /// Whether the snapshot holds no instances
    pub fn is_empty(&self) -> bool {
        self.instance_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_lite_model::{EntityDefinition, EntityId};

    fn store() -> InstanceStore {
        let wall = Arc::new(EntityDefinition::new("IfcWall", true));
        let slab = Arc::new(EntityDefinition::new("IfcSlab", true));
        let mut store = InstanceStore::new();
        for id in [9, 2, 5] {
            store.insert(EntityId(id), EntityInstance::new(EntityId(id), wall.clone()));
        }
        store.insert(EntityId(4), EntityInstance::new(EntityId(4), slab));
        store
    }

    #[test]
    fn test_groups_by_exact_type() {
        let index = TypeIndex::build(&store());

        let walls: Vec<EntityId> = index.exact("IFCWALL").iter().map(|i| i.id).collect();
        assert_eq!(walls, [EntityId(2), EntityId(5), EntityId(9)]);
        assert_eq!(index.count("ifcslab"), 1);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_unknown_name_is_empty() {
        let index = TypeIndex::build(&store());
        assert!(index.exact("IfcDoor").is_empty());
        assert_eq!(index.count("NOT_A_TYPE"), 0);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let store = store();
        assert_eq!(TypeIndex::build(&store), TypeIndex::build(&store));
    }

    #[test]
    fn test_snapshot_ignores_later_inserts() {
        let mut store = store();
        let index = TypeIndex::build(&store);

        let door = Arc::new(EntityDefinition::new("IfcDoor", true));
        store.insert(EntityId(20), EntityInstance::new(EntityId(20), door));

        assert!(index.exact("IFCDOOR").is_empty());
        assert_eq!(TypeIndex::build(&store).count("IFCDOOR"), 1);
    }

    #[test]
    fn test_counts() {
        let index = TypeIndex::build(&store());
        assert_eq!(index.counts(), [("IFCSLAB", 1), ("IFCWALL", 3)]);
        assert!(TypeIndex::build(&InstanceStore::new()).is_empty());
    }
}
