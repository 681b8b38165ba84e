//! Connects a finished [`Definition`] to its instance: the refresh function,
//! the mutation table, `opt-` attribute handlers and slot handlers.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::definition::{Definition, MutationFn, OptionHandler, SlotHandler};
use super::mutations::Mutations;
use super::{with_instance_mut, RefreshFn};
use crate::dom::{self, with_document, NodeId};
use crate::error::{Error, Result};

const OPTION_PREFIX: &str = "opt-";

pub(super) fn install<S: 'static>(name: &Rc<str>, host: NodeId, definition: Definition<S>) -> Result<()> {
    let Definition {
        mut refresh,
        mutations,
        options,
        slots,
        default_slot,
    } = definition;

    let table = mutation_table(name, mutations)?;
    let options = option_table(name, options)?;
    let slots = slot_table(name, host, slots, default_slot)?;

    let erased: RefreshFn =
        Box::new(move |reader| refresh(reader).map(|state| Rc::new(state) as Rc<dyn Any>));
    with_instance_mut(host, |c| {
        c.refresh = Some(erased);
        c.mutations = Some(Rc::new(Mutations::new(name.clone(), table)));
    })
    .ok_or(Error::NotAComponent(host))?;

    if !options.is_empty() {
        observe_options(host, options);
    }
    if !slots.is_empty() {
        observe_slots(host, slots);
    }
    Ok(())
}

fn mutation_table(
    name: &Rc<str>,
    mutations: Vec<(String, MutationFn)>,
) -> Result<BTreeMap<String, MutationFn>> {
    let mut table = BTreeMap::new();
    for (mutation, f) in mutations {
        if mutation.is_empty() || table.contains_key(&mutation) {
            return Err(Error::InvalidMutation {
                component: name.to_string(),
                mutation,
            });
        }
        table.insert(mutation, f);
    }
    Ok(table)
}

/// Keyed by full attribute name.
fn option_table(
    name: &Rc<str>,
    options: Vec<(String, OptionHandler)>,
) -> Result<BTreeMap<String, OptionHandler>> {
    let mut table = BTreeMap::new();
    for (option, handler) in options {
        if option.is_empty() {
            return Err(Error::InvalidOption {
                component: name.to_string(),
                option,
            });
        }
        if option.starts_with(OPTION_PREFIX) {
            log::warn!(
                "<{}> option \"{}\" already starts with \"{}\"; it observes \"{}{}\"",
                name,
                option,
                OPTION_PREFIX,
                OPTION_PREFIX,
                option
            );
        }
        let attribute = format!("{}{}", OPTION_PREFIX, option).to_ascii_lowercase();
        if table.insert(attribute, handler).is_some() {
            return Err(Error::InvalidOption {
                component: name.to_string(),
                option,
            });
        }
    }
    Ok(table)
}

/// Keyed by slot name, `""` for the default slot. Every handler needs a
/// matching `<slot>` in the shadow tree once the initializer returns.
fn slot_table(
    name: &Rc<str>,
    host: NodeId,
    slots: Vec<(String, SlotHandler)>,
    default_slot: Option<SlotHandler>,
) -> Result<BTreeMap<String, SlotHandler>> {
    let mut table = BTreeMap::new();
    for (slot, handler) in slots.into_iter().chain(default_slot.map(|h| (String::new(), h))) {
        let exists = with_document(|doc| doc.find_slot(host, &slot).is_some());
        if !exists || table.contains_key(&slot) {
            return Err(Error::MissingSlot {
                component: name.to_string(),
                slot,
            });
        }
        table.insert(slot, handler);
    }
    Ok(table)
}

fn observe_options(host: NodeId, options: BTreeMap<String, OptionHandler>) {
    let options = Rc::new(options);
    let handlers = options.clone();
    dom::observe_attributes(
        host,
        options.keys().cloned().collect(),
        Rc::new(move |node, attribute| {
            if let Some(handler) = handlers.get(attribute) {
                handler(dom::attribute(node, attribute).as_deref());
            }
        }),
    );

    for (attribute, handler) in options.iter() {
        if let Some(value) = dom::attribute(host, attribute) {
            handler(Some(&value));
        }
    }
}

fn observe_slots(host: NodeId, slots: BTreeMap<String, SlotHandler>) {
    let slots = Rc::new(slots);
    let handlers = slots.clone();
    dom::observe_slots(
        host,
        Rc::new(move |host, slot| {
            if let Some(handler) = handlers.get(slot) {
                handler(&assigned(host, slot));
            }
        }),
    );

    for (slot, handler) in slots.iter() {
        let nodes = assigned(host, slot);
        if !nodes.is_empty() {
            handler(&nodes);
        }
    }
}

fn assigned(host: NodeId, slot: &str) -> Vec<NodeId> {
    with_document(|doc| doc.slot_assignments(host).remove(slot).unwrap_or_default())
}
