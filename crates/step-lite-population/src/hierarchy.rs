// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subtype-aware queries over a type index
//!
//! Two walks over the schema's subtype edges, both depth-first in declared
//! subtype order:
//!
//! - the full closure collects the exact instances of a type and of every
//!   type below it;
//! - the concrete frontier stops each branch at the first instantiable type
//!   it reaches and takes only that type's exact instances, even when the
//!   type has subtypes of its own.
//!
//! Each walk visits a type at most once, so cyclic or diamond-shaped subtype
//! graphs terminate and never yield an instance twice.

use crate::TypeIndex;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use step_lite_model::{EntityDefinition, EntityInstance, Result, SchemaOracle};

/// Resolver combining a type index with a schema oracle
#[derive(Clone, Copy)]
pub struct HierarchyResolver<'a> {
    index: &'a TypeIndex,
    schema: &'a dyn SchemaOracle,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(index: &'a TypeIndex, schema: &'a dyn SchemaOracle) -> Self {
        Self { index, schema }
    }

    /// Instances of `type_name`, optionally with all its subtypes
    ///
    /// # Errors
    /// `Error::UnknownType` if the schema does not declare `type_name`.
    pub fn instances_of_type(
        &self,
        type_name: &str,
        include_subtypes: bool,
    ) -> Result<Vec<Arc<EntityInstance>>> {
        let definition = self.schema.entity_or_err(type_name)?;
        if !include_subtypes {
            return Ok(self.index.exact(definition.key()).to_vec());
        }

        let mut visited = FxHashSet::default();
        let mut instances = Vec::new();
        self.collect_closure(definition, &mut visited, &mut instances);
        Ok(instances)
    }

    /// Instances of the nearest instantiable types at or below `type_name`
    ///
    /// # Errors
    /// `Error::UnknownType` if the schema does not declare `type_name`.
    pub fn instances_of_first_non_abstract_types(
        &self,
        type_name: &str,
    ) -> Result<Vec<Arc<EntityInstance>>> {
        let definition = self.schema.entity_or_err(type_name)?;

        let mut visited = FxHashSet::default();
        let mut instances = Vec::new();
        self.collect_frontier(definition, &mut visited, &mut instances);
        Ok(instances)
    }

    fn collect_closure(
        &self,
        definition: &'a EntityDefinition,
        visited: &mut FxHashSet<String>,
        instances: &mut Vec<Arc<EntityInstance>>,
    ) {
        if !visited.insert(definition.key().to_string()) {
            return;
        }

        instances.extend_from_slice(self.index.exact(definition.key()));
        for subtype in self.subtypes(definition) {
            self.collect_closure(subtype, visited, instances);
        }
    }

    fn collect_frontier(
        &self,
        definition: &'a EntityDefinition,
        visited: &mut FxHashSet<String>,
        instances: &mut Vec<Arc<EntityInstance>>,
    ) {
        if !visited.insert(definition.key().to_string()) {
            return;
        }

        if definition.is_instantiable() {
            instances.extend_from_slice(self.index.exact(definition.key()));
            return;
        }
        for subtype in self.subtypes(definition) {
            self.collect_frontier(subtype, visited, instances);
        }
    }

    /// Resolved direct subtypes; edges the oracle cannot resolve are skipped
    fn subtypes(
        &self,
        definition: &'a EntityDefinition,
    ) -> impl Iterator<Item = &'a Arc<EntityDefinition>> + 'a {
        let schema = self.schema;
        definition
            .subtypes()
            .iter()
            .filter_map(move |name| match schema.entity(name) {
                Some(subtype) => Some(subtype),
                None => {
                    log::warn!(
                        "Subtype {} of {} is not declared in schema {}",
                        name,
                        definition.name(),
                        schema.name()
                    );
                    None
                }
            })
    }
}
