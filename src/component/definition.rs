use std::any::Any;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::engine::StateReader;
use crate::error::Result;

pub type MutationFn = Rc<dyn Fn(&dyn Any)>;
pub type OptionHandler = Rc<dyn Fn(Option<&str>)>;
pub type SlotHandler = Rc<dyn Fn(&[NodeId])>;

/// What an initializer returns: the refresh function plus optional handlers.
///
/// # Example
/// ```ignore
/// define("click-counter", |shadow, scheduler| {
///     let count = Rc::new(Cell::new(0));
///     let text = dom::create_text("0");
///     shadow.append(text)?;
///
///     let shown = count.clone();
///     Ok(Definition::new(move |_| {
///         dom::set_text(text, &shown.get().to_string())?;
///         Ok(shown.get())
///     })
///     .mutation("increment", move |_| {
///         count.set(count.get() + 1);
///         scheduler.schedule();
///     }))
/// })?;
/// ```
pub struct Definition<S> {
    pub(crate) refresh: Box<dyn FnMut(&StateReader) -> Result<S>>,
    pub(crate) mutations: Vec<(String, MutationFn)>,
    pub(crate) options: Vec<(String, OptionHandler)>,
    pub(crate) slots: Vec<(String, SlotHandler)>,
    pub(crate) default_slot: Option<SlotHandler>,
}

impl<S: 'static> Definition<S> {
    pub fn new<F>(refresh: F) -> Self
    where
        F: FnMut(&StateReader) -> Result<S> + 'static,
    {
        Self {
            refresh: Box::new(refresh),
            mutations: Vec::new(),
            options: Vec::new(),
            slots: Vec::new(),
            default_slot: None,
        }
    }

    /// Expose a named operation other code can call to request new output.
    pub fn mutation<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Any) + 'static,
    {
        self.mutations.push((name.into(), Rc::new(f)));
        self
    }

    /// Handle the `opt-{name}` attribute. Called with `None` when it is removed.
    pub fn option<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&str>) + 'static,
    {
        self.options.push((name.into(), Rc::new(f)));
        self
    }

    /// Handle changes to the nodes assigned to the named slot.
    pub fn slot<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[NodeId]) + 'static,
    {
        self.slots.push((name.into(), Rc::new(f)));
        self
    }

    /// Handle changes to the nodes assigned to the unnamed slot.
    pub fn default_slot<F>(mut self, f: F) -> Self
    where
        F: Fn(&[NodeId]) + 'static,
    {
        self.default_slot = Some(Rc::new(f));
        self
    }
}
