// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for instance data
//!
//! Identifiers, attribute payloads and parsed instances. Attribute payloads
//! are carried opaquely; the population index only looks at an instance's
//! identifier and entity definition.

use crate::EntityDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Type-safe instance identifier
///
/// Wraps the raw Part21 instance name (e.g., #123 becomes EntityId(123))
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Attribute value as written in the source
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Instance reference (#123)
    EntityRef(EntityId),
    /// Boolean value (.T. / .F.)
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as instance reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }
}

/// One parsed instance of a population
///
/// The entity definition is shared with the schema the instance was parsed
/// against; the instance never owns it.
#[derive(Clone, Debug)]
pub struct EntityInstance {
    /// Instance identifier, unique within its population
    pub id: EntityId,
    /// Exact runtime type
    pub definition: Arc<EntityDefinition>,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl EntityInstance {
    /// Create an instance without attributes
    pub fn new(id: EntityId, definition: Arc<EntityDefinition>) -> Self {
        Self {
            id,
            definition,
            attributes: Vec::new(),
        }
    }

    /// Attach attribute values
    pub fn with_attributes(mut self, attributes: Vec<AttributeValue>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Type name as declared in the schema
    pub fn type_name(&self) -> &str {
        self.definition.name()
    }

    /// Canonical (uppercase) type name
    pub fn type_key(&self) -> &str {
        self.definition.key()
    }

    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }
}

impl PartialEq for EntityInstance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.definition.key() == other.definition.key()
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(42).to_string(), "#42");
        assert_eq!(u32::from(EntityId::from(7)), 7);
    }

    #[test]
    fn test_instance_type_names() {
        let wall = Arc::new(EntityDefinition::new("IfcWall", true));
        let instance = EntityInstance::new(EntityId(3), wall)
            .with_attributes(vec![AttributeValue::String("guid".into())]);

        assert_eq!(instance.type_name(), "IfcWall");
        assert_eq!(instance.type_key(), "IFCWALL");
        assert_eq!(instance.get(0).and_then(|v| v.as_string()), Some("guid"));
        assert!(instance.get(1).is_none());
    }
}
