//! The interception engine: shadow table, intent signals and classifier
//! behind one handle.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::classify::{Classifier, DeleteRequest, Verdict};
use crate::config::GuardConfig;
use crate::shadow::{Payload, ShadowTable};
use crate::signals::{Clock, IntentSignals, SystemClock, UserEvent};

/// Everything runs on the UI thread, so shared ownership is `Rc<RefCell<_>>`.
pub type SharedGuard<K, C = SystemClock> = Rc<RefCell<Guard<K, C>>>;

/// Truncation guard state for one page.
#[derive(Debug)]
pub struct Guard<K, C = SystemClock> {
    shadow: ShadowTable<K>,
    signals: IntentSignals<C>,
    classifier: Classifier,
}

impl<K> Guard<K, SystemClock>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Guard on the wall clock, wrapped for sharing between hooks and listeners.
    pub fn shared(config: &GuardConfig) -> SharedGuard<K> {
        Rc::new(RefCell::new(Self::new(config, SystemClock)))
    }
}

impl<K, C> Guard<K, C>
where
    K: Copy + Eq + Hash + Debug,
    C: Clock,
{
    pub fn new(config: &GuardConfig, clock: C) -> Self {
        Self {
            shadow: ShadowTable::new(),
            signals: IntentSignals::new(clock, config.recent_window()),
            classifier: Classifier::new(config.policy, config.short_edit_max),
        }
    }

    /// Feed an input event. Returns whether the active policy counted it.
    pub fn observe(&mut self, event: UserEvent) -> bool {
        if !self.classifier.policy().qualifies(event) {
            return false;
        }
        tracing::debug!(?event, "user intent recorded");
        self.signals.record_user_action();
        true
    }

    /// Insert hook: seed if needed, then add `units`.
    pub fn on_insert(
        &mut self,
        key: K,
        probe: impl FnOnce() -> Option<usize>,
        units: usize,
    ) -> usize {
        self.shadow.seed_with(key, probe);
        self.shadow.record_insert(key, units).unwrap_or_default()
    }

    /// Delete hook: seed if needed, classify, and on allow update the shadow
    /// length. The caller forwards to the host only when the verdict allows.
    pub fn on_delete(
        &mut self,
        key: K,
        probe: impl FnOnce() -> Option<usize>,
        request: DeleteRequest,
    ) -> Verdict {
        let tracked = self.shadow.seed_with(key, probe);
        let verdict = self
            .classifier
            .classify(tracked, request, self.signals.snapshot());

        match verdict {
            Verdict::Allow(reason) => {
                let remaining = self
                    .shadow
                    .record_delete(key, request.length)
                    .unwrap_or_default();
                tracing::debug!(
                    index = request.index,
                    length = request.length,
                    remaining,
                    ?reason,
                    "delete allowed"
                );
            }
            Verdict::Block => {
                tracing::warn!(
                    index = request.index,
                    length = request.length,
                    tracked,
                    "blocked host auto-truncation"
                );
            }
        }
        verdict
    }

    /// Forget an instance the host has discarded.
    pub fn release(&mut self, key: K) {
        if let Some(len) = self.shadow.remove(key) {
            tracing::trace!(?key, len, "instance released");
        }
    }

    pub fn shadow(&self) -> &ShadowTable<K> {
        &self.shadow
    }

    pub fn shadow_mut(&mut self) -> &mut ShadowTable<K> {
        &mut self.shadow
    }

    pub fn signals(&self) -> &IntentSignals<C> {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut IntentSignals<C> {
        &mut self.signals
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

/// A host editor's insert/delete primitives, for hosts written in Rust.
pub trait EditorMethods {
    type Output;

    fn insert_at(&mut self, index: usize, payload: Payload<'_>) -> Self::Output;

    fn delete_at(&mut self, index: usize, length: usize) -> Self::Output;

    /// Real text length, if readable. Only called when seeding.
    fn text_len(&self) -> Option<usize>;
}

/// Decorator routing an editor's primitives through a shared [`Guard`].
pub struct Guarded<E, K, C = SystemClock> {
    inner: E,
    key: K,
    guard: SharedGuard<K, C>,
}

impl<E, K, C> Guarded<E, K, C>
where
    E: EditorMethods,
    K: Copy + Eq + Hash + Debug,
    C: Clock,
{
    pub fn new(inner: E, key: K, guard: SharedGuard<K, C>) -> Self {
        Self { inner, key, guard }
    }

    pub fn insert_at(&mut self, index: usize, payload: Payload<'_>) -> E::Output {
        let inner = &self.inner;
        self.guard
            .borrow_mut()
            .on_insert(self.key, || inner.text_len(), payload.units());
        self.inner.insert_at(index, payload)
    }

    /// Returns `None` when the deletion was blocked and never reached the host.
    pub fn delete_at(&mut self, index: usize, length: usize) -> Option<E::Output> {
        let inner = &self.inner;
        let verdict = self.guard.borrow_mut().on_delete(
            self.key,
            || inner.text_len(),
            DeleteRequest::new(index, length),
        );
        verdict
            .is_allowed()
            .then(|| self.inner.delete_at(index, length))
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::classify::{AllowReason, Policy};
    use crate::testing::ManualClock;

    /// Plain string-backed editor. Embeds are stored as U+FFFC.
    #[derive(Debug, Default)]
    struct Doc {
        text: String,
    }

    impl Doc {
        fn with_len(len: usize) -> Self {
            Self {
                text: "a".repeat(len),
            }
        }
    }

    impl EditorMethods for Doc {
        type Output = usize;

        fn insert_at(&mut self, index: usize, payload: Payload<'_>) -> usize {
            let index = index.min(self.text.len());
            match payload {
                Payload::Text(text) => self.text.insert_str(index, text),
                Payload::Embed => self.text.insert(index, '\u{FFFC}'),
            }
            self.text.chars().count()
        }

        fn delete_at(&mut self, index: usize, length: usize) -> usize {
            let start = index.min(self.text.len());
            let end = index.saturating_add(length).min(self.text.len());
            self.text.replace_range(start..end, "");
            self.text.chars().count()
        }

        fn text_len(&self) -> Option<usize> {
            Some(self.text.chars().count())
        }
    }

    fn guard_with(policy: Policy, clock: &ManualClock) -> SharedGuard<u32, ManualClock> {
        let config = GuardConfig {
            policy,
            ..GuardConfig::default()
        };
        Rc::new(RefCell::new(Guard::new(&config, clock.clone())))
    }

    fn tracked(guard: &SharedGuard<u32, ManualClock>) -> Option<usize> {
        guard.borrow().shadow().get(1)
    }

    #[test]
    fn test_paste_then_truncate_is_blocked_under_strict() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Strict, &clock);
        let mut editor = Guarded::new(Doc::with_len(50_000), 1, guard.clone());

        // Paste fires, then the host inserts the pasted text.
        assert!(!guard.borrow_mut().observe(UserEvent::Paste));
        let pasted = "b".repeat(40_000);
        editor.insert_at(50_000, Payload::Text(&pasted));
        assert_eq!(tracked(&guard), Some(90_000));

        // Host truncates to its limit right away.
        clock.advance(Duration::from_millis(5));
        assert_eq!(editor.delete_at(32_000, 58_000), None);
        assert_eq!(tracked(&guard), Some(90_000));
        assert_eq!(editor.inner().text.len(), 90_000);
    }

    #[test]
    fn test_paste_then_truncate_slips_through_permissive() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Permissive, &clock);
        let mut editor = Guarded::new(Doc::with_len(50_000), 1, guard.clone());

        assert!(guard.borrow_mut().observe(UserEvent::Paste));
        let pasted = "b".repeat(40_000);
        editor.insert_at(50_000, Payload::Text(&pasted));

        assert_eq!(editor.delete_at(32_000, 58_000), Some(32_000));
        assert_eq!(tracked(&guard), Some(32_000));
    }

    #[test]
    fn test_backspace_authorizes_tail_delete() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Strict, &clock);
        let mut editor = Guarded::new(Doc::with_len(100), 1, guard.clone());

        assert!(guard.borrow_mut().observe(UserEvent::DeleteKey));
        clock.advance(Duration::from_millis(30));

        assert_eq!(editor.delete_at(99, 1), Some(99));
        assert_eq!(tracked(&guard), Some(99));
    }

    #[test]
    fn test_backspace_expires() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Strict, &clock);
        let mut editor = Guarded::new(Doc::with_len(100), 1, guard.clone());

        guard.borrow_mut().observe(UserEvent::DeleteKey);
        clock.advance(Duration::from_millis(250));

        assert_eq!(editor.delete_at(99, 1), None);
        assert_eq!(tracked(&guard), Some(100));
    }

    #[test]
    fn test_blocked_delete_leaves_store_untouched() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Strict, &clock);
        let mut editor = Guarded::new(Doc::with_len(10), 1, guard.clone());

        assert_eq!(editor.delete_at(4, 6), None);
        assert_eq!(tracked(&guard), Some(10));
        assert_eq!(editor.into_inner().text, "a".repeat(10));
    }

    #[test]
    fn test_seeding_happens_once() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Strict, &clock);
        let mut editor = Guarded::new(Doc::with_len(20), 1, guard.clone());

        editor.insert_at(0, Payload::Text("xy"));
        assert_eq!(tracked(&guard), Some(22));

        // Changes behind the guard's back are not re-read.
        editor.inner_mut().text.push_str("zzz");
        editor.insert_at(0, Payload::Embed);
        assert_eq!(tracked(&guard), Some(23));
    }

    #[test]
    fn test_first_call_delete_seeds_before_classifying() {
        let clock = ManualClock::new();
        let guard = guard_with(Policy::Strict, &clock);
        let mut editor = Guarded::new(Doc::with_len(100), 1, guard.clone());

        // Interior relative to the seeded length, so allowed.
        assert_eq!(editor.delete_at(10, 5), Some(95));
        assert_eq!(tracked(&guard), Some(95));
    }

    #[test]
    fn test_verdict_reasons() {
        let clock = ManualClock::new();
        let config = GuardConfig::default();
        let mut guard: Guard<u32, ManualClock> = Guard::new(&config, clock.clone());

        let seed = || Some(100);
        assert_eq!(
            guard.on_delete(1, seed, DeleteRequest::new(0, 3)),
            Verdict::Allow(AllowReason::FromStart)
        );
        assert_eq!(
            guard.on_delete(1, seed, DeleteRequest::new(10, 3)),
            Verdict::Allow(AllowReason::Interior)
        );
        assert_eq!(
            guard.on_delete(1, seed, DeleteRequest::new(90, 4)),
            Verdict::Block
        );

        guard.signals_mut().begin_manual_clear();
        assert_eq!(
            guard.on_delete(1, seed, DeleteRequest::new(90, 4)),
            Verdict::Allow(AllowReason::ManualClear)
        );
        assert_eq!(guard.shadow().get(1), Some(90));
    }

    #[test]
    fn test_released_instances_leave_no_entries() {
        let clock = ManualClock::new();
        let config = GuardConfig::default();
        let mut guard: Guard<u32, ManualClock> = Guard::new(&config, clock);

        for key in 0..100_000u32 {
            guard.on_insert(key, || Some(3), 2);
            guard.on_delete(key, || None, DeleteRequest::new(0, 1));
            guard.release(key);
        }
        assert!(guard.shadow().is_empty());

        // Releasing an unknown instance is harmless.
        guard.release(7);
        assert!(guard.shadow().is_empty());
    }

    #[test]
    fn test_released_instance_reseeds() {
        let clock = ManualClock::new();
        let config = GuardConfig::default();
        let mut guard: Guard<u32, ManualClock> = Guard::new(&config, clock);

        assert_eq!(guard.on_insert(1, || Some(10), 5), 15);
        guard.release(1);
        assert_eq!(guard.on_insert(1, || Some(4), 1), 5);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert { at: usize, len: usize },
        Delete { index: usize, length: usize },
        DeleteKey,
        Advance(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..256, 0usize..8).prop_map(|(at, len)| Op::Insert { at, len }),
            (0usize..256, 0usize..6).prop_map(|(index, length)| Op::Delete { index, length }),
            Just(Op::DeleteKey),
            (0u64..300).prop_map(Op::Advance),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_allowed_sequences_match_running_total(
            ops in prop::collection::vec(op_strategy(), 1..300),
        ) {
            let clock = ManualClock::new();
            let guard = guard_with(Policy::Strict, &clock);
            let mut editor = Guarded::new(Doc::default(), 1, guard.clone());

            let mut expected: usize = 0;
            for op in ops {
                match op {
                    Op::Insert { at, len } => {
                        let text = "x".repeat(len);
                        editor.insert_at(at % (expected + 1), Payload::Text(&text));
                        expected += len;
                    }
                    Op::Delete { index, length } => {
                        let index = index % (expected + 2);
                        if editor.delete_at(index, length).is_some() {
                            expected = expected.saturating_sub(length);
                        }
                    }
                    Op::DeleteKey => {
                        guard.borrow_mut().observe(UserEvent::DeleteKey);
                    }
                    Op::Advance(ms) => clock.advance(Duration::from_millis(ms)),
                }
                prop_assert_eq!(tracked(&guard), Some(expected));
            }
        }
    }
}
