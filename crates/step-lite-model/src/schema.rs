// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema oracle: entity-type definitions and their subtype edges
//!
//! Type names are case-insensitive. Every lookup goes through the canonical
//! uppercase key, while definitions keep the spelling they were declared with.

use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::sync::Arc;

/// Schema-level description of one entity type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDefinition {
    name: String,
    key: String,
    instantiable: bool,
    subtypes: Vec<String>,
    supertypes: Vec<String>,
}

impl EntityDefinition {
    /// Create a definition without subtype edges
    ///
    /// `instantiable` is true for concrete types, false for abstract ones.
    pub fn new(name: impl Into<String>, instantiable: bool) -> Self {
        let name = name.into();
        let key = name.to_ascii_uppercase();
        Self {
            name,
            key,
            instantiable,
            subtypes: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    /// Name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical uppercase name used for lookups
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the type may have direct instances
    pub fn is_instantiable(&self) -> bool {
        self.instantiable
    }

    /// Direct subtypes, in declaration order
    pub fn subtypes(&self) -> &[String] {
        &self.subtypes
    }

    /// Direct supertypes
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }
}

/// Read-only view of entity-type definitions
///
/// Implementations must answer lookups case-insensitively. The population
/// index never mutates a schema and assumes it stays fixed while queries run.
pub trait SchemaOracle: Send + Sync {
    /// Schema identifier (e.g. `IFC2X3`)
    fn name(&self) -> &str;

    /// Look up a definition by type name (case-insensitive)
    fn entity(&self, type_name: &str) -> Option<&Arc<EntityDefinition>>;

    /// Look up a definition or fail with [`Error::UnknownType`]
    fn entity_or_err(&self, type_name: &str) -> Result<&Arc<EntityDefinition>> {
        self.entity(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_ascii_uppercase()))
    }
}

/// In-memory schema keyed by canonical type name
#[derive(Clone, Debug, Default)]
pub struct SchemaDefinition {
    name: String,
    entities: FxHashMap<String, Arc<EntityDefinition>>,
    /// Canonical keys in declaration order
    order: Vec<String>,
}

impl SchemaDefinition {
    /// Start building a schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Build a schema from its JSON description
    ///
    /// ```json
    /// { "name": "DEMO",
    ///   "entities": [
    ///     { "name": "WallElement", "abstract": true },
    ///     { "name": "Wall", "supertypes": ["WallElement"] } ] }
    /// ```
    ///
    /// Subtype order follows the order of `entities`.
    pub fn from_json(json: &str) -> Result<Self> {
        let description: SchemaDescription = serde_json::from_str(json)?;

        let mut builder = SchemaBuilder::new(description.name);
        for entity in &description.entities {
            builder = builder.entity(entity.name.as_str(), !entity.is_abstract);
        }
        for entity in &description.entities {
            for supertype in &entity.supertypes {
                builder = builder.subtype(supertype.as_str(), entity.name.as_str());
            }
        }
        builder.build()
    }

    /// Number of entity definitions
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the schema declares no entities
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All definitions in declaration order
    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityDefinition>> {
        self.order.iter().filter_map(|key| self.entities.get(key))
    }
}

impl SchemaOracle for SchemaDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity(&self, type_name: &str) -> Option<&Arc<EntityDefinition>> {
        // Part21 sources already carry uppercase names
        self.entities
            .get(type_name)
            .or_else(|| self.entities.get(&type_name.to_ascii_uppercase()))
    }
}

/// Builder for [`SchemaDefinition`]
///
/// Subtype edges keep the order in which they are added. Cyclic edges are
/// accepted; consumers guard their own traversals.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    name: String,
    entities: Vec<EntityDefinition>,
    positions: FxHashMap<String, usize>,
    edges: Vec<(String, String)>,
    duplicates: Vec<String>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare an entity type
    pub fn entity(mut self, name: impl Into<String>, instantiable: bool) -> Self {
        let definition = EntityDefinition::new(name, instantiable);
        if self.positions.contains_key(definition.key()) {
            self.duplicates.push(definition.name);
            return self;
        }
        self.positions
            .insert(definition.key.clone(), self.entities.len());
        self.entities.push(definition);
        self
    }

    /// Declare a concrete (instantiable) entity type
    pub fn concrete(self, name: impl Into<String>) -> Self {
        self.entity(name, true)
    }

    /// Declare an abstract entity type
    pub fn abstract_entity(self, name: impl Into<String>) -> Self {
        self.entity(name, false)
    }

    /// Declare `subtype` as a direct subtype of `supertype`
    pub fn subtype(mut self, supertype: impl Into<String>, subtype: impl Into<String>) -> Self {
        self.edges.push((supertype.into(), subtype.into()));
        self
    }

    /// Resolve edges and freeze the schema
    pub fn build(self) -> Result<SchemaDefinition> {
        if let Some(name) = self.duplicates.first() {
            return Err(Error::schema(format!("entity {name} declared twice")));
        }

        let mut entities = self.entities;
        for (supertype, subtype) in &self.edges {
            let sup = position(&self.positions, supertype)?;
            let sub = position(&self.positions, subtype)?;

            let sub_name = entities[sub].name.clone();
            if entities[sup]
                .subtypes
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&sub_name))
            {
                continue;
            }
            entities[sup].subtypes.push(sub_name);
            let sup_name = entities[sup].name.clone();
            entities[sub].supertypes.push(sup_name);
        }

        let order: Vec<String> = entities.iter().map(|e| e.key.clone()).collect();
        let entities = entities
            .into_iter()
            .map(|e| (e.key.clone(), Arc::new(e)))
            .collect();

        Ok(SchemaDefinition {
            name: self.name,
            entities,
            order,
        })
    }
}

fn position(positions: &FxHashMap<String, usize>, name: &str) -> Result<usize> {
    positions
        .get(&name.to_ascii_uppercase())
        .copied()
        .ok_or_else(|| Error::schema(format!("subtype edge names undeclared entity {name}")))
}

#[derive(Deserialize)]
struct SchemaDescription {
    name: String,
    #[serde(default)]
    entities: Vec<EntityDescription>,
}

#[derive(Deserialize)]
struct EntityDescription {
    name: String,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    supertypes: Vec<String>,
}
