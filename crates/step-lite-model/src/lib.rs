// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP-Lite Model - Shared types and trait seams for STEP instance populations
//!
//! This crate provides the vocabulary shared by the parser and the population
//! index: identifiers, attribute payloads, parsed instances, and the read-only
//! view of an EXPRESS schema that queries walk.
//!
//! # Architecture
//!
//! The crate is organized around two seams:
//!
//! - [`SchemaOracle`] - Entity-type lookup (name, instantiable flag, subtypes)
//! - [`InstanceParser`] - Turns a Part21 source into `(id, instance)` visits
//!
//! [`SchemaDefinition`] is the in-memory oracle, built with [`SchemaBuilder`]
//! or deserialized from a JSON description.
//!
//! # Example
//!
//! ```
//! use step_lite_model::{SchemaBuilder, SchemaOracle};
//!
//! let schema = SchemaBuilder::new("DEMO")
//!     .abstract_entity("WallElement")
//!     .concrete("Wall")
//!     .subtype("WallElement", "Wall")
//!     .build()
//!     .unwrap();
//!
//! let wall_element = schema.entity("wallelement").unwrap();
//! assert!(!wall_element.is_instantiable());
//! assert_eq!(wall_element.subtypes(), ["Wall"]);
//! ```

pub mod error;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use schema::*;
pub use traits::*;
pub use types::*;
