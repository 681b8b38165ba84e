#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use sapling::prelude::*;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// A component with a default slot whose refresh logs and returns its `id` attribute.
pub fn define_labelled(name: &str, log: &Log) -> ComponentType {
    let log = log.clone();
    define(name, move |shadow, _| {
        shadow.append(dom::create_element("slot")?)?;
        let host = shadow.host();
        let log = log.clone();
        Ok(Definition::new(move |_| {
            let label = dom::attribute(host, "id").unwrap_or_default();
            log.borrow_mut().push(label.clone());
            Ok(label)
        }))
    })
    .unwrap()
}

/// Create an instance of `ty` labelled `id` under `parent`.
pub fn mount(ty: &ComponentType, id: &str, parent: NodeId) -> NodeId {
    let node = ty.create().unwrap();
    dom::set_attribute(node, "id", id).unwrap();
    dom::append_child(parent, node).unwrap();
    node
}

pub fn count_refresh_events(node: NodeId) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let seen = count.clone();
    dom::listen(node, "refresh", move |event| {
        if event.target == event.current_target {
            *seen.borrow_mut() += 1;
        }
    });
    count
}
