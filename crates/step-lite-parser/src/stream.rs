// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parse-event stream: one decoded instance per DATA record

use crate::scanner::{EntityRecord, EntityScanner};
use crate::tokenizer::parse_entity_at;
use crate::UnknownTypePolicy;
use std::iter::FusedIterator;
use std::sync::Arc;
use step_lite_model::{EntityId, EntityInstance, Error, Result, SchemaOracle};

/// Iterator over the instances of a Part21 source
///
/// Yields instances in source order. After the first error the stream is
/// exhausted.
pub struct InstanceStream<'a> {
    content: &'a str,
    scanner: EntityScanner<'a>,
    schema: &'a dyn SchemaOracle,
    unknown_types: UnknownTypePolicy,
    failed: bool,
}

impl<'a> InstanceStream<'a> {
    pub(crate) fn new(
        content: &'a str,
        schema: &'a dyn SchemaOracle,
        unknown_types: UnknownTypePolicy,
    ) -> Self {
        Self {
            content,
            scanner: EntityScanner::new(content),
            schema,
            unknown_types,
            failed: false,
        }
    }

    fn fail(&mut self, error: Error) -> Option<Result<EntityInstance>> {
        self.failed = true;
        Some(Err(error))
    }

    fn decode(&self, record: &EntityRecord<'a>) -> Result<Option<EntityInstance>> {
        let definition = match self.schema.entity(record.type_name) {
            Some(definition) => Arc::clone(definition),
            None => match self.unknown_types {
                UnknownTypePolicy::Skip => {
                    log::warn!(
                        "Skipping #{}: type {} is not declared in schema {}",
                        record.id,
                        record.type_name,
                        self.schema.name()
                    );
                    return Ok(None);
                }
                UnknownTypePolicy::Reject => {
                    return Err(Error::UnknownEntityType {
                        id: EntityId(record.id),
                        type_name: record.type_name.to_string(),
                    });
                }
            },
        };

        let raw = parse_entity_at(self.content, record.start, record.end)
            .map_err(|e| Error::syntax(record.start, format!("#{}: {}", record.id, e)))?;

        Ok(Some(EntityInstance {
            id: EntityId(raw.id),
            definition,
            attributes: raw.attribute_values(),
        }))
    }
}

impl Iterator for InstanceStream<'_> {
    type Item = Result<EntityInstance>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let record = match self.scanner.next_entity()? {
                Ok(record) => record,
                Err(e) => return self.fail(e),
            };

            match self.decode(&record) {
                Ok(Some(instance)) => return Some(Ok(instance)),
                Ok(None) => continue,
                Err(e) => return self.fail(e),
            }
        }
    }
}

impl FusedIterator for InstanceStream<'_> {}
