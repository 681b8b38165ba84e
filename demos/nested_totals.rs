//! A `<price-total>` sums the state of every `<price-tag>` projected into it.
//! Each tag renders before the total, so the total always sees fresh prices.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sapling::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let tag = define("price-tag", |shadow, scheduler| {
        let host = shadow.host();
        let text = dom::create_text("");
        shadow.append(text)?;
        Ok(Definition::new(move |_| {
            let cents: u64 = dom::attribute(host, "cents")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0);
            dom::set_text(text, &format!("{}.{:02}", cents / 100, cents % 100))?;
            Ok(cents)
        })
        .option("discount", move |_| scheduler.schedule()))
    })?;

    let total = define("price-total", |shadow, scheduler| {
        shadow.append(dom::create_element("slot")?)?;
        let summary = dom::create_text("");
        shadow.append(summary)?;

        let items: Rc<RefCell<Vec<NodeId>>> = Rc::new(RefCell::new(Vec::new()));
        let tracked = items.clone();
        Ok(Definition::new(move |reader| {
            let mut sum = 0u64;
            for &item in items.borrow().iter() {
                match reader.get::<u64>(item) {
                    Ok(cents) => sum += *cents,
                    Err(err) => log::warn!("skipping {:?}: {}", item, err),
                }
            }
            dom::set_text(summary, &format!(" = {}.{:02}", sum / 100, sum % 100))?;
            Ok(sum)
        })
        .default_slot(move |nodes| {
            *tracked.borrow_mut() = nodes.to_vec();
            scheduler.schedule();
        }))
    })?;

    let basket = total.create()?;
    for cents in ["250", "1999", "75"] {
        let item = tag.create()?;
        dom::set_attribute(item, "cents", cents)?;
        dom::append_child(basket, item)?;
    }
    dom::append_child(dom::root(), basket)?;

    let frames = Rc::new(Cell::new(0));
    let counter = frames.clone();
    dom::listen(basket, "refresh", move |event| {
        if event.target == basket {
            println!("{}", dom::text_content(dom::shadow_root(basket).unwrap_or(basket)));
        }
    });

    Engine::new()
        .on_update(move || {
            counter.set(counter.get() + 1);
            if counter.get() > 2 {
                stop();
            }
        })
        .run()?;
    log::info!("rendered over {} frame(s)", frames.get());
    Ok(())
}
