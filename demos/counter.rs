//! A counter whose `increment` mutation is called from a background thread.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use sapling::prelude::*;

fn main() -> Result<()> {
    let counter = define("click-counter", |shadow, scheduler| {
        let count = Rc::new(Cell::new(0u32));
        let text = dom::create_text("0");
        shadow.append(text)?;

        let shown = count.clone();
        Ok(Definition::new(move |_| {
            dom::set_text(text, &shown.get().to_string())?;
            Ok(shown.get())
        })
        .mutation("increment", move |_| {
            count.set(count.get() + 1);
            scheduler.schedule();
        }))
    })?;

    let node = counter.create()?;
    dom::append_child(dom::root(), node)?;
    dom::listen(node, "refresh", move |event| {
        let shadow = dom::shadow_root(event.target).unwrap_or(event.target);
        log::info!("counter shows {}", dom::text_content(shadow));
    });

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for _ in 0..5 {
            std::thread::sleep(Duration::from_millis(200));
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    let mut received = 0;
    Engine::new()
        .on_update(move || {
            while rx.try_recv().is_ok() {
                received += 1;
                if let Err(err) = mutations(node).and_then(|m| m.invoke("increment")) {
                    log::error!("{}", err);
                }
            }
            if received == 5 && !sapling::engine::queue::is_queued(node) {
                stop();
            }
        })
        .run()
}
