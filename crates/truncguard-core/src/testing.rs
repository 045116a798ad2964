//! Deterministic clock and scheduler for unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::clear::Scheduler;
use crate::signals::Clock;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::from_secs(1))),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn rewind(&self, by: Duration) {
        self.offset.set(self.offset.get().saturating_sub(by));
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    fn set_elapsed(&self, at: Duration) {
        self.offset.set(at);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

struct Task {
    due: Duration,
    cancelled: Rc<Cell<bool>>,
    run: Box<dyn FnOnce()>,
}

/// Cancels its task on drop, like a browser timeout handle.
pub struct TaskHandle(Rc<Cell<bool>>);

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

/// Scheduler driven by [`ManualScheduler::advance`].
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    queue: Rc<RefCell<Vec<Task>>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Move time forward, running due tasks in order.
    pub fn advance(&self, by: Duration) {
        let target = self.clock.elapsed() + by;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                queue.retain(|task| !task.cancelled.get());
                let earliest = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, task)| task.due <= target)
                    .min_by_key(|(_, task)| task.due)
                    .map(|(i, _)| i);
                earliest.map(|i| queue.remove(i))
            };
            let Some(task) = next else { break };
            self.clock.set_elapsed(task.due);
            (task.run)();
        }
        self.clock.set_elapsed(target);
    }

    /// Live tasks still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|task| !task.cancelled.get())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = TaskHandle;

    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.queue.borrow_mut().push(Task {
            due: self.clock.elapsed() + delay,
            cancelled: Rc::clone(&cancelled),
            run: task,
        });
        TaskHandle(cancelled)
    }
}
