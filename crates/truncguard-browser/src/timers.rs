//! `Scheduler` on browser timeouts.

use std::time::Duration;

use gloo_timers::callback::Timeout;
use truncguard_core::Scheduler;

/// Defers callbacks with `setTimeout`. Dropping the returned [`Timeout`]
/// clears it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    type Handle = Timeout;

    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Timeout {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, task)
    }
}
