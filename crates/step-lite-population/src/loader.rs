// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registration of parsed instances and load outcomes

use crate::InstanceStore;
use step_lite_model::{EntityId, EntityInstance, Error, InstanceVisitor, Result};

/// Decides how a parsed instance enters the store
///
/// # Example
///
/// ```ignore
/// // Keep only walls
/// population.load_with(
///     |store: &mut InstanceStore, id: EntityId, instance: EntityInstance| {
///         if instance.type_key() == "IFCWALL" {
///             store.insert(id, instance);
///         }
///     },
///     None::<fn(&InstanceStore)>,
/// );
/// ```
pub trait RegistrationVisitor {
    /// Register one parsed instance
    fn register(&mut self, store: &mut InstanceStore, id: EntityId, instance: EntityInstance);
}

impl<F> RegistrationVisitor for F
where
    F: FnMut(&mut InstanceStore, EntityId, EntityInstance),
{
    fn register(&mut self, store: &mut InstanceStore, id: EntityId, instance: EntityInstance) {
        self(store, id, instance)
    }
}

/// Inserts every instance under its identifier; the last write wins
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRegistration;

impl RegistrationVisitor for DefaultRegistration {
    fn register(&mut self, store: &mut InstanceStore, id: EntityId, instance: EntityInstance) {
        store.insert(id, instance);
    }
}

/// Adapts a [`RegistrationVisitor`] to the parser's visitor seam
pub(crate) struct Registration<'s, V> {
    store: &'s mut InstanceStore,
    visitor: &'s mut V,
    pub(crate) visited: usize,
    pub(crate) redefined: usize,
}

impl<'s, V: RegistrationVisitor> Registration<'s, V> {
    pub(crate) fn new(store: &'s mut InstanceStore, visitor: &'s mut V) -> Self {
        Self {
            store,
            visitor,
            visited: 0,
            redefined: 0,
        }
    }
}

impl<V: RegistrationVisitor> InstanceVisitor for Registration<'_, V> {
    fn visit(&mut self, id: EntityId, instance: EntityInstance) {
        if self.store.contains(id) {
            log::debug!("{} is defined more than once; the last definition wins", id);
            self.redefined += 1;
        }
        self.visitor.register(self.store, id, instance);
        self.visited += 1;
    }
}

/// Result of one load
///
/// A load never fails outright: instances registered before a parse failure
/// stay in the store, and the failure is reported here.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Instances handed to the registration visitor
    pub visited: usize,
    /// Instances whose identifier was already in the store when visited
    pub redefined: usize,
    failure: Option<Error>,
}

impl LoadOutcome {
    pub(crate) fn complete(visited: usize, redefined: usize) -> Self {
        Self {
            visited,
            redefined,
            failure: None,
        }
    }

    pub(crate) fn aborted(visited: usize, redefined: usize, failure: Error) -> Self {
        Self {
            visited,
            redefined,
            failure: Some(failure),
        }
    }

    /// Whether the whole source was read
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Why the load stopped early, if it did
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Visited count on success, the failure otherwise
    pub fn into_result(self) -> Result<usize> {
        match self.failure {
            None => Ok(self.visited),
            Some(e) => Err(e),
        }
    }
}
