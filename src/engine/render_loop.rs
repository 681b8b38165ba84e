use std::cell::Cell;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};

use super::{queue, sweep};
use crate::error::{Error, Result};

/// Sweeps allowed per frame before the rest of the queue is deferred.
pub const RECURSION_LIMIT: usize = 1000;

/// Default delay between frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

thread_local! {
    static RENDERING: Cell<bool> = const { Cell::new(false) };
    static STARTED: Cell<bool> = const { Cell::new(false) };
    static LIMIT: Cell<usize> = const { Cell::new(RECURSION_LIMIT) };
    static LIMIT_WARNINGS: Cell<usize> = const { Cell::new(0) };
}

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sweeps: usize,
    /// The queue was still non-empty when the sweep budget ran out.
    pub limit_reached: bool,
}

/// Whether a frame is being rendered on this thread.
pub fn is_rendering() -> bool {
    RENDERING.with(Cell::get)
}

pub fn recursion_limit() -> usize {
    LIMIT.with(Cell::get)
}

pub fn set_recursion_limit(limit: usize) {
    LIMIT.with(|l| l.set(limit.max(1)));
}

/// Number of frames that hit the recursion limit so far.
pub fn limit_warnings() -> usize {
    LIMIT_WARNINGS.with(Cell::get)
}

pub fn is_started() -> bool {
    STARTED.with(Cell::get)
}

/// Owned by the frame timer's callback; the thread counts as started until
/// the timer source is removed or its loop is dropped.
struct StartedGuard;

impl StartedGuard {
    fn enter() -> Self {
        STARTED.with(|s| s.set(true));
        StartedGuard
    }
}

impl Drop for StartedGuard {
    fn drop(&mut self) {
        STARTED.with(|s| s.set(false));
        log::debug!("render loop stopped");
    }
}

struct RenderingGuard;

impl RenderingGuard {
    fn enter() -> Self {
        RENDERING.with(|r| r.set(true));
        RenderingGuard
    }
}

impl Drop for RenderingGuard {
    fn drop(&mut self) {
        RENDERING.with(|r| r.set(false));
    }
}

/// Render one frame: sweep until the queue is empty or the limit is reached.
///
/// Calling this while a frame is already rendering does nothing.
pub fn tick() -> TickReport {
    let mut report = TickReport::default();
    if is_rendering() {
        log::debug!("tick requested while rendering; ignored");
        return report;
    }
    let _rendering = RenderingGuard::enter();
    let limit = recursion_limit();

    while queue::queued_len() > 0 {
        if report.sweeps >= limit {
            log::warn!(
                "recursion limit of {} sweeps reached; {} component(s) deferred to the next frame",
                limit,
                queue::queued_len()
            );
            LIMIT_WARNINGS.with(|w| w.set(w.get() + 1));
            report.limit_reached = true;
            break;
        }
        report.sweeps += 1;
        sweep::render_sweep();
    }
    report
}

/// Tick every `interval` on `handle`'s loop, calling `on_frame` first.
///
/// Only one timer is live per thread; while it is, later calls return
/// `Ok(None)`. Removing the returned source, or dropping its loop, lets a new
/// one start.
pub(crate) fn start<'l, Data: 'l>(
    handle: &LoopHandle<'l, Data>,
    interval: Duration,
    mut on_frame: impl FnMut() + 'l,
) -> Result<Option<RegistrationToken>> {
    if is_started() {
        return Ok(None);
    }
    let started = StartedGuard::enter();
    let token = handle
        .insert_source(Timer::from_duration(interval), move |_, _, _| {
            let _started = &started;
            on_frame();
            let report = tick();
            if report.sweeps > 0 {
                log::trace!("frame rendered in {} sweep(s)", report.sweeps);
            }
            TimeoutAction::ToDuration(interval)
        })
        .map_err(|err| Error::FrameSource(err.error.to_string()))?;
    log::info!("render loop started, one frame every {:?}", interval);
    Ok(Some(token))
}
