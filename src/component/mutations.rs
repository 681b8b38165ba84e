use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::{with_instance, MutationFn};
use crate::dom::NodeId;
use crate::error::{Error, Result};

/// A component's frozen mutation interface.
///
/// Built once at construction and shared behind an `Rc`; there is no way to
/// add, replace or remove entries afterwards.
pub struct Mutations {
    component: Rc<str>,
    table: BTreeMap<String, MutationFn>,
}

impl fmt::Debug for Mutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutations")
            .field("component", &self.component)
            .field("names", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Mutations {
    pub(crate) fn new(component: Rc<str>, table: BTreeMap<String, MutationFn>) -> Self {
        Self { component, table }
    }

    /// Call a mutation with an argument of any type.
    pub fn call(&self, name: &str, argument: &dyn Any) -> Result<()> {
        let mutation = self
            .table
            .get(name)
            .ok_or_else(|| Error::UnknownMutation {
                component: self.component.to_string(),
                mutation: name.to_string(),
            })?;
        mutation(argument);
        Ok(())
    }

    /// Call a mutation that takes no argument.
    pub fn invoke(&self, name: &str) -> Result<()> {
        self.call(name, &())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The mutation interface of a component.
///
/// Fails while the component's initializer is still running.
pub fn mutations(node: NodeId) -> Result<Rc<Mutations>> {
    match with_instance(node, |c| (c.name.clone(), c.mutations.clone())) {
        Some((_, Some(mutations))) => Ok(mutations),
        Some((name, None)) => Err(Error::MutationsUnavailable(name.to_string())),
        None => Err(Error::NotAComponent(node)),
    }
}
