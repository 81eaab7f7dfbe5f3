// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for loading and querying populations

use crate::EntityId;
use thiserror::Error;

/// Result type alias for population operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, loading or querying a population
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed Part21 content
    #[error("Syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Instance whose type the schema does not declare
    #[error("Entity {id} has type {type_name}, which is not declared in the schema")]
    UnknownEntityType { id: EntityId, type_name: String },

    /// Queried type name not declared in the schema
    #[error("Type not found: {0}")]
    UnknownType(String),

    /// No schema assigned to the population
    #[error("No schema set")]
    SchemaNotSet,

    /// Inconsistent schema definition
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema description could not be deserialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new syntax error
    pub fn syntax(offset: usize, msg: impl Into<String>) -> Self {
        Error::Syntax {
            offset,
            message: msg.into(),
        }
    }

    /// Create a new schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::InvalidSchema(msg.into())
    }
}
