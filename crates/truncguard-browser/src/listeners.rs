//! Capture-phase listeners feeding the intent signals.

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, KeyboardEvent, Node};

use truncguard_core::{
    EnterToClear, GuardConfig, KeyPress, Modifiers, SharedGuard, SystemClock, UserEvent,
};

use crate::hooks::HookContext;
use crate::host::ContainerClear;
use crate::instances::InstanceKey;
use crate::timers::TimeoutScheduler;

type BrowserEnterToClear =
    EnterToClear<InstanceKey, SystemClock, TimeoutScheduler, ContainerClear>;

/// Event types that map directly to a [`UserEvent`], without inspecting the event.
const PLAIN_EVENTS: [(&str, UserEvent); 4] = [
    ("cut", UserEvent::Cut),
    ("paste", UserEvent::Paste),
    ("pointerdown", UserEvent::PointerDown),
    ("compositionstart", UserEvent::CompositionStart),
];

/// Register listeners for every event that may count as user intent.
///
/// All of them are registered regardless of policy; the guard decides which
/// ones qualify.
pub fn intent_listeners(
    target: &EventTarget,
    guard: &SharedGuard<InstanceKey>,
) -> Vec<EventListener> {
    let options = EventListenerOptions::run_in_capture_phase();
    let mut listeners = Vec::with_capacity(PLAIN_EVENTS.len() + 1);

    let keydown_guard = guard.clone();
    listeners.push(EventListener::new_with_options(
        target,
        "keydown",
        options,
        move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if let Some(user_event) = UserEvent::from_key(&event.key()) {
                observe(&keydown_guard, user_event);
            }
        },
    ));

    for (event_type, user_event) in PLAIN_EVENTS {
        let guard = guard.clone();
        listeners.push(EventListener::new_with_options(
            target,
            event_type,
            options,
            move |_| observe(&guard, user_event),
        ));
    }

    listeners
}

fn observe(guard: &SharedGuard<InstanceKey>, event: UserEvent) {
    match guard.try_borrow_mut() {
        Ok(mut guard) => {
            guard.observe(event);
        }
        Err(_) => tracing::debug!(?event, "guard busy, event dropped"),
    }
}

/// Register the Enter-to-clear keydown listener.
pub fn enter_to_clear_listener(
    target: &EventTarget,
    config: &GuardConfig,
    ctx: &HookContext,
) -> EventListener {
    let helper: BrowserEnterToClear = EnterToClear::new(
        ctx.guard.clone(),
        ContainerClear::new(config, ctx.keys.clone()),
        TimeoutScheduler,
        config,
    );
    let editor_selector = config.editor_selector.clone();

    EventListener::new_with_options(
        target,
        "keydown",
        EventListenerOptions::run_in_capture_phase(),
        move |event| {
            let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let key = key_event.key();
            if key != "Enter" {
                return;
            }

            let press = KeyPress {
                key: &key,
                modifiers: Modifiers {
                    shift: key_event.shift_key(),
                    ctrl: key_event.ctrl_key(),
                    alt: key_event.alt_key(),
                    meta: key_event.meta_key(),
                },
                in_editor: inside_editor(event, &editor_selector),
            };
            if helper.on_keydown(&press) {
                tracing::debug!("enter-to-clear scheduled");
            }
        },
    )
}

/// Whether the event's target lies inside the element matching `selector`.
fn inside_editor(event: &Event, selector: &str) -> bool {
    let Some(editor) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector(selector).ok().flatten())
    else {
        return false;
    };
    let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
    target.is_some() && editor.contains(target.as_ref())
}
