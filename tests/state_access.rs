mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{define_labelled, entries, mount, new_log, Log};
use sapling::prelude::*;

type Reads = Rc<RefCell<Vec<std::result::Result<String, AccessError>>>>;

/// A component with a default slot whose refresh reads the state of every node in `targets`.
fn define_inspector(name: &str, targets: &Rc<RefCell<Vec<NodeId>>>, reads: &Reads) -> ComponentType {
    let targets = targets.clone();
    let reads = reads.clone();
    define(name, move |shadow, scheduler| {
        shadow.append(dom::create_element("slot")?)?;
        let targets = targets.clone();
        let reads = reads.clone();
        Ok(Definition::new(move |reader| {
            for &target in targets.borrow().iter() {
                reads.borrow_mut().push(reader.get_cloned::<String>(target));
            }
            Ok(String::from("inspector"))
        })
        .mutation("inspect", move |_| scheduler.schedule()))
    })
    .unwrap()
}

fn inspect(node: NodeId) {
    mutations(node).unwrap().invoke("inspect").unwrap();
    tick();
}

#[test]
fn test_descendant_state_is_readable() {
    let log = new_log();
    let kind = define_labelled("readable-item", &log);
    let targets = Rc::new(RefCell::new(Vec::new()));
    let reads: Reads = Rc::new(RefCell::new(Vec::new()));
    let inspector = define_inspector("readable-inspector", &targets, &reads);

    let owner = mount(&inspector, "owner", dom::root());
    let child = mount(&kind, "child", owner);
    let grandchild = mount(&kind, "grandchild", child);
    targets.borrow_mut().extend([child, grandchild]);

    tick();
    assert_eq!(
        *reads.borrow(),
        vec![Ok("child".to_string()), Ok("grandchild".to_string())]
    );
}

#[test]
fn test_refused_reads() {
    let log = new_log();
    let kind = define_labelled("refused-item", &log);
    let targets = Rc::new(RefCell::new(Vec::new()));
    let reads: Reads = Rc::new(RefCell::new(Vec::new()));
    let inspector = define_inspector("refused-inspector", &targets, &reads);

    let owner = mount(&inspector, "owner", dom::root());
    let sibling = mount(&kind, "sibling", dom::root());
    let plain = dom::create_element("div").unwrap();
    dom::append_child(owner, plain).unwrap();
    let unattached = kind.create().unwrap();
    tick();

    targets.borrow_mut().extend([sibling, plain, unattached]);
    reads.borrow_mut().clear();
    inspect(owner);
    assert_eq!(
        *reads.borrow(),
        vec![
            Err(AccessError::NotDescendant),
            Err(AccessError::NotAComponent),
            Err(AccessError::NotReady),
        ]
    );
}

#[test]
fn test_state_of_wrong_type_is_refused() {
    let targets = Rc::new(RefCell::new(Vec::new()));
    let reads: Reads = Rc::new(RefCell::new(Vec::new()));
    let inspector = define_inspector("typed-inspector", &targets, &reads);
    let numeric = define("numeric-item", |_, _| Ok(Definition::new(|_| Ok(7u64)))).unwrap();

    let owner = mount(&inspector, "owner", dom::root());
    let number = mount(&numeric, "number", owner);
    targets.borrow_mut().push(number);
    tick();

    assert_eq!(*reads.borrow(), vec![Err(AccessError::WrongType)]);
}

#[test]
fn test_failed_child_is_not_ready() {
    let targets = Rc::new(RefCell::new(Vec::new()));
    let reads: Reads = Rc::new(RefCell::new(Vec::new()));
    let inspector = define_inspector("waiting-inspector", &targets, &reads);
    let broken = define("broken-item", |_, _| {
        Ok(Definition::<String>::new(|_| Err(Error::refresh("not today"))))
    })
    .unwrap();

    let owner = mount(&inspector, "owner", dom::root());
    let child = mount(&broken, "child", owner);
    targets.borrow_mut().push(child);
    tick();

    assert_eq!(*reads.borrow(), vec![Err(AccessError::NotReady)]);
}

#[test]
fn test_detached_descendant_is_refused() {
    let log = new_log();
    let kind = define_labelled("detached-item", &log);
    let targets = Rc::new(RefCell::new(Vec::new()));
    let reads: Reads = Rc::new(RefCell::new(Vec::new()));
    let inspector = define_inspector("detached-inspector", &targets, &reads);

    let owner = mount(&inspector, "owner", dom::root());
    let child = mount(&kind, "child", owner);
    tick();

    dom::remove(child).unwrap();
    targets.borrow_mut().push(child);
    inspect(owner);
    assert_eq!(*reads.borrow(), vec![Err(AccessError::NotReady)]);
}

#[test]
fn test_reads_outside_refresh_are_refused() {
    let log = new_log();
    let kind = define_labelled("outside-item", &log);
    let node = mount(&kind, "node", dom::root());
    tick();
    assert_eq!(
        read_state::<String>(node).unwrap_err(),
        AccessError::OutsideRefresh
    );

    let kept = Rc::new(RefCell::new(None));
    let slot = kept.clone();
    let keeper = define("keeper-item", move |shadow, _| {
        shadow.append(dom::create_element("slot")?)?;
        let slot = slot.clone();
        Ok(Definition::new(move |reader| {
            *slot.borrow_mut() = Some(*reader);
            Ok(())
        }))
    })
    .unwrap();
    let owner = mount(&keeper, "owner", dom::root());
    let child = mount(&kind, "child", owner);
    tick();

    let reader: StateReader = kept.borrow().expect("reader was kept");
    assert_eq!(reader.owner(), owner);
    assert_eq!(
        reader.get::<String>(child).unwrap_err(),
        AccessError::OutsideRefresh
    );
}

/// While a nested refresh runs, only the innermost component may read.
#[test]
fn test_outer_reader_is_refused_inside_nested_refresh() {
    let outer_reader = Rc::new(RefCell::new(None));
    let verdict = Rc::new(RefCell::new(None));
    let grandchild = Rc::new(RefCell::new(None));

    let leaf = {
        let grandchild = grandchild.clone();
        define("nested-leaf", move |shadow, _| {
            *grandchild.borrow_mut() = Some(shadow.host());
            Ok(Definition::new(|_| Ok(String::from("leaf"))))
        })
        .unwrap()
    };
    let nested = {
        let outer_reader = outer_reader.clone();
        let verdict = verdict.clone();
        let grandchild = grandchild.clone();
        define("nested-middle", move |shadow, _| {
            shadow.append(leaf.create()?)?;
            let outer_reader = outer_reader.clone();
            let verdict = verdict.clone();
            let grandchild = grandchild.clone();
            Ok(Definition::new(move |_| {
                let reader: Option<StateReader> = *outer_reader.borrow();
                let target: Option<NodeId> = *grandchild.borrow();
                if let (Some(reader), Some(target)) = (reader, target) {
                    *verdict.borrow_mut() = Some(reader.get::<String>(target).map(|s| (*s).clone()));
                }
                Ok(())
            }))
        })
        .unwrap()
    };
    let outer = {
        let outer_reader = outer_reader.clone();
        define("nested-outer", move |shadow, _| {
            let outer_reader = outer_reader.clone();
            let nested = nested.clone();
            Ok(Definition::new(move |reader| {
                *outer_reader.borrow_mut() = Some(*reader);
                shadow.append(nested.create()?)?;
                Ok(())
            }))
        })
        .unwrap()
    };

    let node = outer.create().unwrap();
    dom::append_child(dom::root(), node).unwrap();
    tick();
    assert_eq!(*verdict.borrow(), Some(Err(AccessError::OutsideRefresh)));
}

type Counts = Rc<RefCell<Vec<std::result::Result<u32, AccessError>>>>;

/// A component without slots whose refresh reads the state of `child`.
fn define_holder(name: &str, child: &Rc<Cell<Option<NodeId>>>, reads: &Counts, log: &Log) -> ComponentType {
    let child = child.clone();
    let reads = reads.clone();
    let log = log.clone();
    define(name, move |_, _| {
        let child = child.clone();
        let reads = reads.clone();
        let log = log.clone();
        Ok(Definition::new(move |reader| {
            log.borrow_mut().push("holder".into());
            if let Some(child) = child.get() {
                reads.borrow_mut().push(reader.get_cloned::<u32>(child));
            }
            Ok(())
        }))
    })
    .unwrap()
}

fn define_seven(name: &str, log: &Log) -> ComponentType {
    let log = log.clone();
    define(name, move |_, _| {
        let log = log.clone();
        Ok(Definition::new(move |_| {
            log.borrow_mut().push("child".into());
            Ok(7u32)
        }))
    })
    .unwrap()
}

#[test]
fn test_unslotted_child_is_readable_from_a_frame() {
    let log = new_log();
    let child = Rc::new(Cell::new(None));
    let reads: Counts = Rc::new(RefCell::new(Vec::new()));
    let holder = define_holder("framed-holder", &child, &reads, &log);
    let seven = define_seven("framed-seven", &log);

    let host = holder.create().unwrap();
    dom::append_child(dom::root(), host).unwrap();
    let node = seven.create().unwrap();
    dom::append_child(host, node).unwrap();
    child.set(Some(node));

    tick();
    assert_eq!(entries(&log), vec!["child", "holder"]);
    assert_eq!(*reads.borrow(), vec![Ok(7)]);
}

#[test]
fn test_unslotted_child_is_readable_when_inserted_during_a_frame() {
    let log = new_log();
    let child = Rc::new(Cell::new(None));
    let reads: Counts = Rc::new(RefCell::new(Vec::new()));
    let holder = define_holder("inserted-holder", &child, &reads, &log);
    let seven = define_seven("inserted-seven", &log);

    let target = child.clone();
    let outer = define("inserting-outer", move |shadow, _| {
        let holder = holder.clone();
        let seven = seven.clone();
        let target = target.clone();
        Ok(Definition::new(move |_| {
            if target.get().is_none() {
                let host = holder.create()?;
                let node = seven.create()?;
                dom::append_child(host, node)?;
                target.set(Some(node));
                shadow.append(host)?;
            }
            Ok(())
        }))
    })
    .unwrap();

    let node = outer.create().unwrap();
    dom::append_child(dom::root(), node).unwrap();
    tick();
    assert_eq!(entries(&log), vec!["child", "holder"]);
    assert_eq!(*reads.borrow(), vec![Ok(7)]);
    assert!(is_attached(child.get().unwrap()));
}
