mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{define_labelled, entries, mount, new_log};
use sapling::component::has_rendered;
use sapling::engine::queue;
use sapling::prelude::*;

#[test]
fn test_detach_before_frame_cancels_the_refresh() {
    let log = new_log();
    let kind = define_labelled("detach-item", &log);

    let node = mount(&kind, "gone", dom::root());
    assert!(queue::is_queued(node));
    dom::remove(node).unwrap();

    assert!(!queue::is_queued(node));
    assert!(!is_attached(node));
    assert_eq!(tick(), TickReport::default());
    assert!(entries(&log).is_empty());

    dom::append_child(dom::root(), node).unwrap();
    tick();
    assert_eq!(entries(&log), vec!["gone"]);
}

#[test]
fn test_detach_releases_the_whole_subtree() {
    let log = new_log();
    let kind = define_labelled("subtree-item", &log);

    let top = mount(&kind, "top", dom::root());
    let middle = mount(&kind, "middle", top);
    let bottom = mount(&kind, "bottom", middle);
    tick();
    assert!(has_rendered(bottom));

    dom::remove(top).unwrap();
    for node in [top, middle, bottom] {
        assert!(!is_attached(node));
        assert!(!has_rendered(node));
    }

    dom::append_child(dom::root(), top).unwrap();
    assert_eq!(queue::queued(), vec![top, middle, bottom]);
    log.borrow_mut().clear();
    tick();
    assert_eq!(entries(&log), vec!["bottom", "middle", "top"]);
}

#[test]
fn test_schedule_while_detached_is_ignored() {
    let renders = Rc::new(Cell::new(0));
    let counter = renders.clone();
    let ty = define("idle-item", move |_, scheduler| {
        let renders = counter.clone();
        Ok(Definition::new(move |_| {
            renders.set(renders.get() + 1);
            Ok(())
        })
        .mutation("refresh", move |_| scheduler.schedule()))
    })
    .unwrap();

    let node = ty.create().unwrap();
    mutations(node).unwrap().invoke("refresh").unwrap();
    assert!(!queue::is_queued(node));
    tick();
    assert_eq!(renders.get(), 0);

    dom::append_child(dom::root(), node).unwrap();
    tick();
    assert_eq!(renders.get(), 1);
}

#[test]
fn test_moving_a_component_renders_it_again() {
    let log = new_log();
    let kind = define_labelled("moving-item", &log);
    let first = dom::create_element("div").unwrap();
    let second = dom::create_element("div").unwrap();
    dom::append_child(dom::root(), first).unwrap();
    dom::append_child(dom::root(), second).unwrap();

    let node = mount(&kind, "mover", first);
    tick();
    assert!(has_rendered(node));

    dom::append_child(second, node).unwrap();
    assert!(is_attached(node));
    assert!(!has_rendered(node));
    assert!(queue::is_queued(node));
    tick();
    assert_eq!(entries(&log), vec!["mover", "mover"]);
}

/// Components created and inserted by a refresh are attached and rendered
/// before that refresh continues.
#[test]
fn test_in_pass_attach_renders_synchronously() {
    let log = new_log();
    let leaf_host = Rc::new(Cell::new(None));

    let deepest = {
        let log = log.clone();
        let leaf_host = leaf_host.clone();
        define("chain-three", move |shadow, _| {
            leaf_host.set(Some(shadow.host()));
            let log = log.clone();
            Ok(Definition::new(move |_| {
                log.borrow_mut().push("three".to_string());
                Ok(3u32)
            }))
        })
        .unwrap()
    };
    let middle = {
        let log = log.clone();
        define("chain-two", move |shadow, _| {
            shadow.append(deepest.create()?)?;
            let log = log.clone();
            Ok(Definition::new(move |_| {
                log.borrow_mut().push("two".to_string());
                Ok(2u32)
            }))
        })
        .unwrap()
    };
    let top = {
        let log = log.clone();
        define("chain-one", move |shadow, _| {
            shadow.append(middle.create()?)?;
            let log = log.clone();
            Ok(Definition::new(move |_| {
                log.borrow_mut().push("one".to_string());
                Ok(1u32)
            }))
        })
        .unwrap()
    };

    let observed = Rc::new(RefCell::new(None));
    let parent = {
        let log = log.clone();
        let leaf_host = leaf_host.clone();
        let observed = observed.clone();
        define("chain-parent", move |shadow, _| {
            let log = log.clone();
            let leaf_host = leaf_host.clone();
            let observed = observed.clone();
            let top = top.clone();
            let mut inserted = false;
            Ok(Definition::new(move |reader| {
                if !inserted {
                    inserted = true;
                    shadow.append(top.create()?)?;
                    let leaf = leaf_host.get().ok_or_else(|| Error::refresh("no leaf"))?;
                    *observed.borrow_mut() = Some(reader.get_cloned::<u32>(leaf));
                }
                log.borrow_mut().push("parent".to_string());
                Ok(())
            }))
        })
        .unwrap()
    };

    let node = parent.create().unwrap();
    dom::append_child(dom::root(), node).unwrap();
    let report = tick();

    assert_eq!(report.sweeps, 1);
    assert_eq!(entries(&log), vec!["three", "two", "one", "parent"]);
    assert_eq!(*observed.borrow(), Some(Ok(3)));
    assert!(queue::queued().is_empty());
}

#[test]
fn test_dispose_forgets_the_component() {
    let log = new_log();
    let kind = define_labelled("disposable-item", &log);
    let node = mount(&kind, "temp", dom::root());
    tick();

    assert!(dom::dispose(node).is_err());
    dom::remove(node).unwrap();
    dom::dispose(node).unwrap();
    assert!(!is_component(node));
    assert!(mutations(node).is_err());
}
