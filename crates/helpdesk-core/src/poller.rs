//! Cancellable periodic task, tied to a view's lifetime.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use crate::ports::TimerPort;

/// Stop switch for a running poll loop. Clones share the switch.
#[derive(Clone, Default)]
pub struct PollHandle {
    cancelled: Rc<Cell<bool>>,
}

impl PollHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Call `tick` every `interval_ms` until `handle` is cancelled.
/// Sleeps before the first tick; returns the number of ticks run.
pub async fn run_poll<F, Fut>(
    handle: PollHandle,
    timer: Rc<dyn TimerPort>,
    interval_ms: u64,
    mut tick: F,
) -> u32
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticks = 0;
    loop {
        timer.sleep_ms(interval_ms).await;
        if handle.is_cancelled() {
            log::debug!("Poll loop stopped after {} ticks", ticks);
            return ticks;
        }
        tick().await;
        ticks += 1;
    }
}
