pub mod component;
pub mod dom;
pub mod engine;
pub mod error;

use std::cell::RefCell;
use std::time::Duration;

use calloop::{EventLoop, LoopHandle, LoopSignal, RegistrationToken};

pub use error::{AccessError, Error, Result};

pub mod prelude {
    pub use crate::component::{
        define, is_attached, is_component, mutations, ComponentType, Definition, Mutations,
        Scheduler, ShadowRoot,
    };
    pub use crate::dom::{self, Event, NodeId};
    pub use crate::engine::{read_state, tick, StateReader, TickReport};
    pub use crate::{stop, AccessError, Engine, EngineConfig, Error, Result};
}

pub struct EngineConfig {
    /// Sweeps per frame before remaining work is deferred
    pub recursion_limit: usize,
    pub frame_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recursion_limit: engine::RECURSION_LIMIT,
            frame_interval: engine::FRAME_INTERVAL,
        }
    }
}

/// A callback that gets called each frame before rendering.
/// Use this to feed external events into components, e.g. by calling mutations.
pub type UpdateCallback = Box<dyn FnMut()>;

thread_local! {
    static RUNNING: RefCell<Option<LoopSignal>> = const { RefCell::new(None) };
}

pub struct Engine {
    config: EngineConfig,
    on_update: Option<UpdateCallback>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            on_update: None,
        }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            on_update: None,
        }
    }

    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.config.recursion_limit = limit;
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.config.frame_interval = interval;
        self
    }

    /// Set a callback that gets called each frame before rendering.
    ///
    /// # Example
    /// ```ignore
    /// let (tx, rx) = std::sync::mpsc::channel();
    /// let counter = counter_type.create()?;
    ///
    /// Engine::new()
    ///     .on_update(move || {
    ///         while let Ok(step) = rx.try_recv() {
    ///             mutations(counter).and_then(|m| m.call("add", &step)).ok();
    ///         }
    ///     })
    ///     .run()?;
    /// ```
    pub fn on_update<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Render frames from an existing calloop event loop.
    ///
    /// Rendering is driven by one timer per thread; starting again while that
    /// timer is live only updates the recursion limit. Once the timer's loop
    /// is dropped a new one can be started.
    pub fn start<'l, Data: 'l>(self, handle: &LoopHandle<'l, Data>) -> Result<()> {
        self.register(handle).map(|_| ())
    }

    /// Run an event loop on this thread until [`stop`] is called.
    ///
    /// The frame timer is removed when the loop returns, so the engine can be
    /// run again on the same thread.
    pub fn run(self) -> Result<()> {
        let _ = env_logger::try_init();

        let mut event_loop: EventLoop<()> =
            EventLoop::try_new().map_err(|err| Error::FrameSource(err.to_string()))?;
        RUNNING.with(|running| *running.borrow_mut() = Some(event_loop.get_signal()));
        let token = match self.register(&event_loop.handle()) {
            Ok(token) => token,
            Err(err) => {
                RUNNING.with(|running| running.borrow_mut().take());
                return Err(err);
            }
        };

        let result = event_loop
            .run(None, &mut (), |_| {})
            .map_err(|err| Error::FrameSource(err.to_string()));
        if let Some(token) = token {
            event_loop.handle().remove(token);
        }
        RUNNING.with(|running| running.borrow_mut().take());
        result
    }

    fn register<'l, Data: 'l>(
        self,
        handle: &LoopHandle<'l, Data>,
    ) -> Result<Option<RegistrationToken>> {
        engine::render_loop::set_recursion_limit(self.config.recursion_limit);
        if engine::render_loop::is_started() {
            log::debug!("render loop already running on this thread");
            return Ok(None);
        }

        let mut on_update = self.on_update;
        engine::render_loop::start(handle, self.config.frame_interval, move || {
            if let Some(ref mut callback) = on_update {
                callback();
            }
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop the loop started by [`Engine::run`] on this thread.
pub fn stop() {
    RUNNING.with(|running| {
        if let Some(signal) = running.borrow().as_ref() {
            signal.stop();
        }
    });
}
