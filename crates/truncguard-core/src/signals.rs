//! User intent signals.
//!
//! Records when the user last did something that authorizes removing content,
//! and whether a programmatic clear is in flight. One instance lives for the
//! whole page.

use std::time::Duration;

use web_time::Instant;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `web_time`, which uses `performance.now()` on wasm.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Input events that may count as evidence of intended removal.
///
/// Whether a given event actually qualifies depends on the active
/// [`Policy`](crate::Policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserEvent {
    /// Backspace or Delete.
    DeleteKey,
    Cut,
    Paste,
    PointerDown,
    /// IME composition started.
    CompositionStart,
}

impl UserEvent {
    /// Map a `KeyboardEvent.key` value to an event, if it is a delete key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Backspace" | "Delete" => Some(UserEvent::DeleteKey),
            _ => None,
        }
    }
}

/// Point-in-time view of the signals, as consumed by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub manual_clear: bool,
    pub recent_user_action: bool,
}

/// Intent signal state.
#[derive(Debug)]
pub struct IntentSignals<C> {
    clock: C,
    window: Duration,
    last_action: Option<Instant>,
    manual_clear: bool,
}

impl<C: Clock> IntentSignals<C> {
    pub fn new(clock: C, window: Duration) -> Self {
        Self {
            clock,
            window,
            last_action: None,
            manual_clear: false,
        }
    }

    /// Record a qualifying user action at the current time.
    ///
    /// The stored timestamp never moves backwards, so a fresh press always
    /// extends the window rather than stacking a second one.
    pub fn record_user_action(&mut self) {
        let now = self.clock.now();
        self.last_action = Some(match self.last_action {
            Some(prev) => prev.max(now),
            None => now,
        });
    }

    /// Whether a qualifying action was recorded within the recency window.
    pub fn is_recent_user_action(&self) -> bool {
        match self.last_action {
            Some(at) => self.clock.now().saturating_duration_since(at) < self.window,
            None => false,
        }
    }

    pub fn last_user_action(&self) -> Option<Instant> {
        self.last_action
    }

    pub fn begin_manual_clear(&mut self) {
        tracing::debug!("manual clear started");
        self.manual_clear = true;
    }

    pub fn end_manual_clear(&mut self) {
        tracing::debug!("manual clear finished");
        self.manual_clear = false;
    }

    pub fn is_manual_clearing(&self) -> bool {
        self.manual_clear
    }

    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            manual_clear: self.manual_clear,
            recent_user_action: self.is_recent_user_action(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;

    fn signals(clock: &ManualClock) -> IntentSignals<ManualClock> {
        IntentSignals::new(clock.clone(), Duration::from_millis(200))
    }

    #[test]
    fn test_no_action_is_not_recent() {
        let clock = ManualClock::new();
        let signals = signals(&clock);
        assert!(!signals.is_recent_user_action());
        assert_eq!(signals.snapshot(), SignalSnapshot::default());
    }

    #[test]
    fn test_action_expires_after_window() {
        let clock = ManualClock::new();
        let mut signals = signals(&clock);

        signals.record_user_action();
        assert!(signals.is_recent_user_action());

        clock.advance(Duration::from_millis(199));
        assert!(signals.is_recent_user_action());

        clock.advance(Duration::from_millis(1));
        assert!(!signals.is_recent_user_action());
    }

    #[test]
    fn test_new_action_resets_window() {
        let clock = ManualClock::new();
        let mut signals = signals(&clock);

        signals.record_user_action();
        clock.advance(Duration::from_millis(150));
        signals.record_user_action();
        clock.advance(Duration::from_millis(150));

        assert!(signals.is_recent_user_action());
    }

    #[test]
    fn test_timestamp_is_monotonic() {
        let clock = ManualClock::new();
        let mut signals = signals(&clock);

        clock.advance(Duration::from_millis(500));
        signals.record_user_action();
        let first = signals.last_user_action().unwrap();

        clock.rewind(Duration::from_millis(300));
        signals.record_user_action();
        assert_eq!(signals.last_user_action(), Some(first));
    }

    #[test]
    fn test_manual_clear_flag() {
        let clock = ManualClock::new();
        let mut signals = signals(&clock);

        signals.begin_manual_clear();
        assert!(signals.is_manual_clearing());
        assert!(signals.snapshot().manual_clear);

        signals.end_manual_clear();
        assert!(!signals.is_manual_clearing());
    }

    #[test]
    fn test_from_key() {
        assert_eq!(UserEvent::from_key("Backspace"), Some(UserEvent::DeleteKey));
        assert_eq!(UserEvent::from_key("Delete"), Some(UserEvent::DeleteKey));
        assert_eq!(UserEvent::from_key("Enter"), None);
        assert_eq!(UserEvent::from_key("a"), None);
    }
}
