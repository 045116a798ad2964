//! Enter-to-clear helper.
//!
//! A plain Enter inside the editor schedules a programmatic full clear. The
//! clear runs with the manual-clear flag raised so that hosts which clear via
//! many small end-touching deletes are not mistaken for truncation. The flag
//! drops again after a short release delay, at which point the shadow length
//! is reset to zero.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use std::time::Duration;

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::guard::SharedGuard;
use crate::signals::Clock;

/// Deferred callbacks. Dropping a handle cancels its callback.
pub trait Scheduler {
    type Handle: 'static;

    fn defer(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Self::Handle;
}

/// The host editor's full-clear surface, used outside the insert/delete hooks.
pub trait ClearTarget<K> {
    /// Live handle to the editor being cleared.
    type Editor;

    fn locate(&self) -> Result<Self::Editor, GuardError>;

    fn clear(&self, editor: &Self::Editor) -> Result<(), GuardError>;

    /// Key of the instance whose shadow length should reset, if known.
    fn root_key(&self, editor: &Self::Editor) -> Option<K>;
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// A keydown as seen by the helper.
#[derive(Debug, Clone, Copy)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    pub modifiers: Modifiers,
    /// Whether the event target lies inside the editor element.
    pub in_editor: bool,
}

impl KeyPress<'_> {
    pub fn is_plain_enter(&self) -> bool {
        self.key == "Enter" && !self.modifiers.any()
    }
}

struct ClearShared<K, C, S: Scheduler, T> {
    guard: SharedGuard<K, C>,
    target: T,
    scheduler: S,
    delay: Duration,
    release: Duration,
    pending_clear: RefCell<Option<S::Handle>>,
    pending_release: RefCell<Option<S::Handle>>,
}

impl<K, C, S, T> ClearShared<K, C, S, T>
where
    K: Copy + Eq + Hash + Debug + 'static,
    C: Clock + 'static,
    S: Scheduler + 'static,
    T: ClearTarget<K> + 'static,
{
    fn run_clear(shared: &Rc<Self>) {
        let editor = match shared.target.locate() {
            Ok(editor) => editor,
            Err(e) => {
                tracing::debug!(%e, "enter-to-clear skipped");
                return;
            }
        };

        shared.guard.borrow_mut().signals_mut().begin_manual_clear();
        if let Err(e) = shared.target.clear(&editor) {
            tracing::warn!(%e, "programmatic clear failed");
        }
        let reset = shared.target.root_key(&editor);

        let weak = Rc::downgrade(shared);
        let handle = shared.scheduler.defer(
            shared.release,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.finish(reset);
                }
            }),
        );
        // Replacing a pending release cancels it; the flag stays up until
        // the newest one fires.
        shared.pending_release.replace(Some(handle));
    }

    fn finish(&self, reset: Option<K>) {
        let mut guard = self.guard.borrow_mut();
        guard.signals_mut().end_manual_clear();
        match reset {
            Some(key) => guard.shadow_mut().reset(key),
            None => guard.shadow_mut().reset_all(),
        }
    }
}

/// The Enter-to-clear state machine.
pub struct EnterToClear<K, C, S: Scheduler, T> {
    shared: Rc<ClearShared<K, C, S, T>>,
}

impl<K, C, S, T> EnterToClear<K, C, S, T>
where
    K: Copy + Eq + Hash + Debug + 'static,
    C: Clock + 'static,
    S: Scheduler + 'static,
    T: ClearTarget<K> + 'static,
{
    pub fn new(guard: SharedGuard<K, C>, target: T, scheduler: S, config: &GuardConfig) -> Self {
        Self {
            shared: Rc::new(ClearShared {
                guard,
                target,
                scheduler,
                delay: config.clear_delay(),
                release: config.clear_release(),
                pending_clear: RefCell::new(None),
                pending_release: RefCell::new(None),
            }),
        }
    }

    /// Handle a keydown. Returns whether a clear was scheduled.
    ///
    /// The clear is deferred so the host's own Enter handling (sending the
    /// message) runs first. A second Enter before it fires restarts the delay.
    pub fn on_keydown(&self, press: &KeyPress<'_>) -> bool {
        if !press.in_editor || !press.is_plain_enter() {
            return false;
        }

        let weak = Rc::downgrade(&self.shared);
        let handle = self.shared.scheduler.defer(
            self.shared.delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    ClearShared::run_clear(&shared);
                }
            }),
        );
        self.shared.pending_clear.replace(Some(handle));
        true
    }
}
