// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ModelPopulation - a loaded population and its type queries

use crate::loader::Registration;
use crate::{
    DefaultRegistration, HierarchyResolver, InstanceStore, LoadOutcome, RegistrationVisitor,
    TypeIndex,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use step_lite_model::{EntityId, EntityInstance, Error, InstanceParser, Result, SchemaOracle};
use step_lite_parser::StepParser;

/// All instances of one Part21 source, indexed by type
///
/// Loading and inserting take `&mut self` and drop the cached type index;
/// queries take `&self` and may run from several threads once loading is
/// done.
pub struct ModelPopulation {
    /// Part21 content
    source: String,
    /// Parser driven by `load`
    parser: Box<dyn InstanceParser>,
    /// Schema instances are parsed and queried against
    schema: Option<Arc<dyn SchemaOracle>>,
    /// Where the schema came from, for diagnostics
    schema_file: Option<PathBuf>,
    /// Instance store
    store: InstanceStore,
    /// Type index, built on first query
    type_index: OnceLock<TypeIndex>,
}

impl ModelPopulation {
    /// Create a population over `source` using the default [`StepParser`]
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_parser(source, StepParser::new())
    }

    /// Create a population over `source` using a custom parser
    pub fn with_parser(source: impl Into<String>, parser: impl InstanceParser + 'static) -> Self {
        Self {
            source: source.into(),
            parser: Box::new(parser),
            schema: None,
            schema_file: None,
            store: InstanceStore::new(),
            type_index: OnceLock::new(),
        }
    }

    /// Read the whole source from `reader`
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Ok(Self::new(source))
    }

    /// Read the source from a file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::new(source))
    }

    /// Set the schema (builder style)
    pub fn with_schema(mut self, schema: Arc<dyn SchemaOracle>) -> Self {
        self.set_schema(schema);
        self
    }

    /// Get the schema
    pub fn schema(&self) -> Option<&Arc<dyn SchemaOracle>> {
        self.schema.as_ref()
    }

    /// Set the schema used by subsequent loads and queries
    pub fn set_schema(&mut self, schema: Arc<dyn SchemaOracle>) {
        self.schema = Some(schema);
    }

    /// Get the schema file path
    pub fn schema_file(&self) -> Option<&Path> {
        self.schema_file.as_deref()
    }

    /// Record where the schema came from
    pub fn set_schema_file(&mut self, path: impl Into<PathBuf>) {
        self.schema_file = Some(path.into());
    }

    /// Load with the default registration (insert, last write wins)
    pub fn load(&mut self) -> LoadOutcome {
        self.load_with(DefaultRegistration, None::<fn(&InstanceStore)>)
    }

    /// Load, routing every parsed instance through `visitor`
    ///
    /// The store is emptied first. `on_finished` runs once, and only when
    /// the whole source was read. A parse failure is logged and returned in
    /// the outcome; instances registered before it stay in the store.
    pub fn load_with<V, F>(&mut self, mut visitor: V, on_finished: Option<F>) -> LoadOutcome
    where
        V: RegistrationVisitor,
        F: FnOnce(&InstanceStore),
    {
        self.store = InstanceStore::new();
        self.type_index.take();

        let Some(schema) = self.schema.clone() else {
            log::error!("Cannot load population: no schema set");
            return LoadOutcome::aborted(0, 0, Error::SchemaNotSet);
        };

        let mut registration = Registration::new(&mut self.store, &mut visitor);
        let result = self
            .parser
            .parse(&self.source, schema.as_ref(), &mut registration);
        let (visited, redefined) = (registration.visited, registration.redefined);

        match result {
            Ok(_) => {
                log::info!(
                    "Loaded {} instances against schema {}{}",
                    visited,
                    schema.name(),
                    self.schema_file_note()
                );
                if let Some(on_finished) = on_finished {
                    on_finished(&self.store);
                }
                LoadOutcome::complete(visited, redefined)
            }
            Err(e) => {
                log::error!(
                    "Load aborted after {} instances against schema {}{}: {}",
                    visited,
                    schema.name(),
                    self.schema_file_note(),
                    e
                );
                LoadOutcome::aborted(visited, redefined, e)
            }
        }
    }

    fn schema_file_note(&self) -> String {
        match &self.schema_file {
            Some(path) => format!(" ({})", path.display()),
            None => String::new(),
        }
    }

    /// Add or replace a single instance
    pub fn insert_instance(&mut self, instance: EntityInstance) -> Option<Arc<EntityInstance>> {
        self.type_index.take();
        self.store.insert(instance.id, instance)
    }

    /// The instance store
    pub fn instances(&self) -> &InstanceStore {
        &self.store
    }

    /// Get instance by identifier
    pub fn get_entity(&self, id: EntityId) -> Option<&Arc<EntityInstance>> {
        self.store.get(id)
    }

    /// The type index, built from the store on first use
    pub fn type_index(&self) -> &TypeIndex {
        self.type_index
            .get_or_init(|| TypeIndex::build(&self.store))
    }

    /// Discard the cached type index and build a fresh one
    pub fn rebuild_type_index(&mut self) -> &TypeIndex {
        self.type_index.take();
        self.type_index()
    }

    /// Resolver over the current index and schema
    pub fn resolver(&self) -> Result<HierarchyResolver<'_>> {
        let schema = self.schema.as_deref().ok_or(Error::SchemaNotSet)?;
        Ok(HierarchyResolver::new(self.type_index(), schema))
    }

    /// Instances whose exact type is `type_name`
    pub fn instances_of_type(&self, type_name: &str) -> Result<Vec<Arc<EntityInstance>>> {
        self.instances_of_type_scoped(type_name, false)
    }

    /// Instances of `type_name`, optionally including every subtype
    pub fn instances_of_type_scoped(
        &self,
        type_name: &str,
        include_subtypes: bool,
    ) -> Result<Vec<Arc<EntityInstance>>> {
        self.resolver()?
            .instances_of_type(type_name, include_subtypes)
    }

    /// Instances of the nearest instantiable types at or below `type_name`
    pub fn instances_of_first_non_abstract_types(
        &self,
        type_name: &str,
    ) -> Result<Vec<Arc<EntityInstance>>> {
        self.resolver()?
            .instances_of_first_non_abstract_types(type_name)
    }

    /// `(type name, count)` for every populated type, sorted by name
    pub fn type_counts(&self) -> Vec<(&str, usize)> {
        self.type_index().counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_lite_model::{SchemaBuilder, SchemaDefinition};

    const TEST_STEP: &str = r#"ISO-10303-21;
HEADER;
FILE_NAME('walls.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('DEMO'));
ENDSEC;
DATA;
#1=WALL('w1');
#2=WALL('w2');
#3=CURTAINWALL('c1');
#4=SLAB('s1');
ENDSEC;
END-ISO-10303-21;
"#;

    fn schema() -> Arc<dyn SchemaOracle> {
        let schema: SchemaDefinition = SchemaBuilder::new("DEMO")
            .abstract_entity("WallElement")
            .concrete("Wall")
            .concrete("CurtainWall")
            .concrete("Slab")
            .subtype("WallElement", "Wall")
            .subtype("WallElement", "CurtainWall")
            .build()
            .unwrap();
        Arc::new(schema)
    }

    fn loaded() -> ModelPopulation {
        let mut population = ModelPopulation::new(TEST_STEP).with_schema(schema());
        assert!(population.load().is_complete());
        population
    }

    #[test]
    fn test_load_and_get_entity() {
        let population = loaded();
        assert_eq!(population.instances().len(), 4);
        assert_eq!(population.get_entity(EntityId(3)).unwrap().type_name(), "CurtainWall");
        assert!(population.get_entity(EntityId(99)).is_none());
    }

    #[test]
    fn test_load_without_schema() {
        let mut population = ModelPopulation::new(TEST_STEP);
        let outcome = population.load();
        assert!(matches!(outcome.failure(), Some(Error::SchemaNotSet)));
        assert!(population.instances().is_empty());
        assert!(matches!(
            population.instances_of_type("Wall"),
            Err(Error::SchemaNotSet)
        ));
    }

    #[test]
    fn test_queries() {
        let population = loaded();
        assert_eq!(population.instances_of_type("wall").unwrap().len(), 2);
        assert_eq!(
            population
                .instances_of_type_scoped("WallElement", true)
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            population
                .instances_of_first_non_abstract_types("WallElement")
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            population.type_counts(),
            [("CURTAINWALL", 1), ("SLAB", 1), ("WALL", 2)]
        );
    }

    #[test]
    fn test_insert_invalidates_index() {
        let mut population = loaded();
        assert_eq!(population.instances_of_type("Slab").unwrap().len(), 1);

        let slab = population.schema().unwrap().entity("Slab").unwrap().clone();
        population.insert_instance(EntityInstance::new(EntityId(10), slab));

        assert_eq!(population.instances_of_type("Slab").unwrap().len(), 2);
    }

    #[test]
    fn test_reload_resets_store() {
        let mut population = loaded();
        let slab = population.schema().unwrap().entity("Slab").unwrap().clone();
        population.insert_instance(EntityInstance::new(EntityId(10), slab));

        let outcome = population.load();
        assert_eq!(outcome.into_result().unwrap(), 4);
        assert!(population.get_entity(EntityId(10)).is_none());
    }

    #[test]
    fn test_rebuild_type_index_is_stable() {
        let mut population = loaded();
        let first = population.type_index().clone();
        assert_eq!(&first, population.rebuild_type_index());
    }

    #[test]
    fn test_schema_file_setting() {
        let mut population = loaded();
        assert!(population.schema_file().is_none());
        population.set_schema_file("schemas/demo.exp");
        assert_eq!(population.schema_file(), Some(Path::new("schemas/demo.exp")));
        assert!(population.load().is_complete());
    }
}
