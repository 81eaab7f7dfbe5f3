// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP-Lite Parser - Single-pass Part21 instance parser
//!
//! This crate reads the DATA section of a Part21 (ISO 10303-21) exchange file
//! and resolves every instance's type against a schema oracle. It implements
//! [`InstanceParser`] from `step-lite-model`.
//!
//! # Features
//!
//! - **Record scanning** with `memchr`-accelerated end-of-record search
//! - **Attribute tokenization** using `nom` combinators
//! - **Parse-event stream** - instances come out of an iterator, one per record
//! - **Configurable strictness** for types the schema does not declare
//!
//! # Example
//!
//! ```ignore
//! use step_lite_parser::StepParser;
//!
//! let parser = StepParser::new();
//! for instance in parser.instances(content, &schema) {
//!     let instance = instance?;
//!     println!("{} is a {}", instance.id, instance.type_name());
//! }
//! ```

mod scanner;
mod stream;
mod tokenizer;

pub use scanner::{parse_header, EntityRecord, EntityScanner, HeaderInfo};
pub use stream::InstanceStream;
pub use tokenizer::{parse_entity, RawEntity, Token};

use step_lite_model::{InstanceParser, InstanceVisitor, Result, SchemaOracle};

/// What to do with an instance whose type the schema does not declare
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Abort the pass with `Error::UnknownEntityType`
    #[default]
    Reject,
    /// Drop the instance and keep going
    Skip,
}

/// Part21 parser implementing `InstanceParser`
#[derive(Clone, Debug)]
pub struct StepParser {
    /// Handling of undeclared types
    pub unknown_types: UnknownTypePolicy,
    /// Whether to warn when FILE_SCHEMA does not name the schema in use
    pub check_schema: bool,
}

impl Default for StepParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StepParser {
    /// Create a new parser with default settings
    pub fn new() -> Self {
        Self {
            unknown_types: UnknownTypePolicy::Reject,
            check_schema: true,
        }
    }

    /// Create a parser that skips instances of undeclared types
    pub fn lenient() -> Self {
        Self::new().with_unknown_types(UnknownTypePolicy::Skip)
    }

    /// Set handling of undeclared types
    pub fn with_unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }

    /// Set whether to compare FILE_SCHEMA with the schema in use
    pub fn with_schema_check(mut self, enabled: bool) -> Self {
        self.check_schema = enabled;
        self
    }

    /// Stream the instances of `source`
    pub fn instances<'a>(
        &self,
        source: &'a str,
        schema: &'a dyn SchemaOracle,
    ) -> InstanceStream<'a> {
        if self.check_schema {
            let header = parse_header(source);
            if !header.schema_identifiers.is_empty()
                && !header
                    .schema_identifiers
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(schema.name()))
            {
                log::warn!(
                    "File declares schema {:?} but is being read with {}",
                    header.schema_identifiers,
                    schema.name()
                );
            }
        }

        InstanceStream::new(source, schema, self.unknown_types)
    }
}

impl InstanceParser for StepParser {
    fn parse(
        &self,
        source: &str,
        schema: &dyn SchemaOracle,
        visitor: &mut dyn InstanceVisitor,
    ) -> Result<usize> {
        let mut count = 0;
        for instance in self.instances(source, schema) {
            let instance = instance?;
            visitor.visit(instance.id, instance);
            count += 1;
        }
        Ok(count)
    }
}
