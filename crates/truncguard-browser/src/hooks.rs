//! Wrappers installed around the host's insert and delete primitives.
//!
//! A wrapper has to see the receiver (`this`) the host calls it with, which a
//! `Closure` alone cannot. `bind_receiver` is a tiny JS trampoline that
//! forwards `this` and the arguments array into the Rust hook.

use std::rc::Rc;

use js_sys::{Array, Function, JsString, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use truncguard_core::{DeleteRequest, GuardConfig, HookKind, SharedGuard};

use crate::instances::{InstanceKey, InstanceKeys};

#[wasm_bindgen(inline_js = r#"
export function bind_receiver(hook) {
    return function (...args) {
        return hook(this, args);
    };
}
"#)]
extern "C" {
    fn bind_receiver(hook: &JsValue) -> Function;
}

// `Fn`, not `FnMut`: container blots call the same wrapped method on their
// children while the outer call is still inside `original.apply`.
type HookFn = dyn Fn(JsValue, Array) -> Result<JsValue, JsValue>;

/// State every wrapper needs.
#[derive(Clone)]
pub struct HookContext {
    pub guard: SharedGuard<InstanceKey>,
    pub keys: Rc<InstanceKeys>,
    pub text_property: Rc<str>,
}

impl HookContext {
    pub fn new(guard: SharedGuard<InstanceKey>, config: &GuardConfig) -> Self {
        let weak = Rc::downgrade(&guard);
        let keys = InstanceKeys::with_release(move |key| {
            let Some(guard) = weak.upgrade() else {
                return;
            };
            match guard.try_borrow_mut() {
                Ok(mut guard) => guard.release(key),
                Err(_) => tracing::debug!(?key, "guard busy, instance not released"),
            }
        });
        Self {
            guard,
            keys: Rc::new(keys),
            text_property: config.text_property.as_str().into(),
        }
    }
}

/// Wrap `original` so calls go through the guard first.
///
/// Arguments and return value pass through unchanged. Exceptions thrown by a
/// forwarded original propagate to the host as-is. A blocked delete returns
/// `undefined` without calling the original.
///
/// The guard is released before the original runs, so nested calls the host
/// makes on child objects are tracked and classified on their own. The guard
/// is only found busy if host code runs while it is held, e.g. a getter hit
/// while seeding.
pub fn hook_method(kind: HookKind, original: Function, ctx: &HookContext) -> Function {
    let ctx = ctx.clone();
    let hook = match kind {
        HookKind::Insert => Closure::wrap(Box::new(move |this: JsValue, args: Array| {
            let key = ctx.keys.key_for(&this);
            let units = payload_units(&args.get(1));
            match ctx.guard.try_borrow_mut() {
                Ok(mut guard) => {
                    guard.on_insert(key, || seed_length(&this, &ctx.text_property), units);
                }
                Err(_) => tracing::debug!(?key, "guard busy, insert not tracked"),
            }
            original.apply(&this, &args)
        }) as Box<HookFn>),

        HookKind::Delete => Closure::wrap(Box::new(move |this: JsValue, args: Array| {
            let key = ctx.keys.key_for(&this);
            let request = DeleteRequest::new(arg_index(&args.get(0)), arg_index(&args.get(1)));
            let verdict = match ctx.guard.try_borrow_mut() {
                Ok(mut guard) => {
                    guard.on_delete(key, || seed_length(&this, &ctx.text_property), request)
                }
                Err(_) => {
                    tracing::debug!(?key, "guard busy, delete forwarded");
                    return original.apply(&this, &args);
                }
            };
            if verdict.is_allowed() {
                original.apply(&this, &args)
            } else {
                Ok(JsValue::UNDEFINED)
            }
        }) as Box<HookFn>),
    };

    let wrapper = bind_receiver(hook.as_ref());
    // The wrapper lives as long as the host's class does, i.e. the page.
    hook.forget();
    wrapper
}

/// Length an insert payload adds: string length, or 1 for embeds.
pub fn payload_units(payload: &JsValue) -> usize {
    match payload.dyn_ref::<JsString>() {
        Some(text) => text.length() as usize,
        None => 1,
    }
}

/// Read `instance[property].length` once for seeding.
pub fn seed_length(instance: &JsValue, property: &str) -> Option<usize> {
    if !instance.is_object() {
        return None;
    }
    let text = Reflect::get(instance, &JsValue::from_str(property)).ok()?;
    if let Some(text) = text.dyn_ref::<JsString>() {
        return Some(text.length() as usize);
    }
    if !text.is_object() {
        return None;
    }
    let length = Reflect::get(&text, &JsValue::from_str("length")).ok()?;
    as_index(&length)
}

fn as_index(value: &JsValue) -> Option<usize> {
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as usize)
}

fn arg_index(value: &JsValue) -> usize {
    as_index(value).unwrap_or(0)
}
