// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser seam
//!
//! A parser turns a Part21 source into a sequence of `(id, instance)` visits.
//! It never stores instances itself; whoever supplies the visitor decides
//! where they go.

use crate::{EntityId, EntityInstance, Result, SchemaOracle};

/// Receiver for parsed instances
///
/// Called once per parsed instance, in source order.
pub trait InstanceVisitor {
    /// Accept one parsed instance
    fn visit(&mut self, id: EntityId, instance: EntityInstance);
}

impl<F> InstanceVisitor for F
where
    F: FnMut(EntityId, EntityInstance),
{
    fn visit(&mut self, id: EntityId, instance: EntityInstance) {
        self(id, instance)
    }
}

/// Single-pass instance parser
///
/// # Example
///
/// ```ignore
/// use step_lite_model::{InstanceParser, EntityInstance, EntityId};
///
/// let parser: Box<dyn InstanceParser> = get_parser();
/// let mut seen = Vec::new();
/// let count = parser.parse(content, &schema, &mut |id: EntityId, _: EntityInstance| {
///     seen.push(id);
/// })?;
/// ```
pub trait InstanceParser: Send + Sync {
    /// Parse `source` against `schema`, feeding every instance to `visitor`
    ///
    /// # Returns
    /// The number of instances visited on success. On failure the pass stops
    /// and the error is returned; instances visited before the failure are
    /// not retracted.
    fn parse(
        &self,
        source: &str,
        schema: &dyn SchemaOracle,
        visitor: &mut dyn InstanceVisitor,
    ) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityDefinition;
    use std::sync::Arc;

    #[test]
    fn test_closure_visitor() {
        let wall = Arc::new(EntityDefinition::new("Wall", true));
        let mut ids = Vec::new();
        {
            let mut visitor = |id: EntityId, _: EntityInstance| ids.push(id);
            let visitor: &mut dyn InstanceVisitor = &mut visitor;
            visitor.visit(EntityId(1), EntityInstance::new(EntityId(1), wall.clone()));
            visitor.visit(EntityId(2), EntityInstance::new(EntityId(2), wall));
        }
        assert_eq!(ids, [EntityId(1), EntityId(2)]);
    }
}
