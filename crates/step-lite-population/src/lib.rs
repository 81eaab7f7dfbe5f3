// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP-Lite Population - Schema-aware type index over parsed instances
//!
//! This crate loads a Part21 source into an instance store and answers
//! type-scoped queries against an EXPRESS schema:
//!
//! - exact type: instances whose own type is the queried one
//! - type plus subtypes: the full subtype closure
//! - nearest concrete frontier: per branch, the first instantiable type only
//!
//! # Architecture
//!
//! - [`InstanceStore`] - identifier -> instance, filled by a load
//! - [`TypeIndex`] - immutable exact-type snapshot of a store
//! - [`HierarchyResolver`] - subtype walks over index + schema
//! - [`ModelPopulation`] - drives the parser and owns store, schema and index
//!
//! # Example
//!
//! ```ignore
//! use step_lite_population::ModelPopulation;
//! use std::sync::Arc;
//!
//! let mut population = ModelPopulation::open("model.ifc")?.with_schema(Arc::new(schema));
//! let outcome = population.load();
//! if let Some(e) = outcome.failure() {
//!     eprintln!("partial load: {e}");
//! }
//!
//! let walls = population.instances_of_type_scoped("IfcWall", true)?;
//! println!("Found {} walls", walls.len());
//! ```

mod hierarchy;
mod index;
mod loader;
mod population;
mod store;

pub use hierarchy::HierarchyResolver;
pub use index::TypeIndex;
pub use loader::{DefaultRegistration, LoadOutcome, RegistrationVisitor};
pub use population::ModelPopulation;
pub use store::InstanceStore;

pub use step_lite_model::{EntityId, EntityInstance, Error, Result, SchemaOracle};
