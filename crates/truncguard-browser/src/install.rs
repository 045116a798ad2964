//! One-time installation of the interception layer.
//!
//! Installation replaces the page's `Object.defineProperty` with a version
//! that wraps the configured insert/delete methods as the host defines them
//! and forwards every definition to the original. This is global for the
//! page and cannot be undone, so it runs at most once.

use std::cell::Cell;

use gloo_events::EventListener;
use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use truncguard_core::{Guard, GuardConfig, GuardError, MethodHooks, SharedGuard};

use crate::hooks::{HookContext, hook_method};
use crate::instances::{InstanceKey, InstanceKeys};
use crate::{host_error, listeners};

thread_local! {
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
}

/// A live installation. Dropping it removes the event listeners; the
/// property-definition override stays in place.
pub struct Installation {
    ctx: HookContext,
    _listeners: Vec<EventListener>,
}

impl Installation {
    pub fn guard(&self) -> &SharedGuard<InstanceKey> {
        &self.ctx.guard
    }

    pub fn keys(&self) -> &InstanceKeys {
        &self.ctx.keys
    }
}

/// Whether [`install`] has already succeeded on this page.
pub fn is_installed() -> bool {
    INSTALLED.with(Cell::get)
}

/// Install interception, intent listeners and (if enabled) Enter-to-clear.
///
/// Must run before the host defines its editor classes; methods defined
/// earlier are not wrapped.
pub fn install(config: GuardConfig) -> Result<Installation, GuardError> {
    config.validate()?;
    let window = web_sys::window().ok_or_else(|| GuardError::Host("no window".to_string()))?;

    if INSTALLED.with(|installed| installed.replace(true)) {
        return Err(GuardError::AlreadyInstalled);
    }

    let ctx = HookContext::new(Guard::shared(&config), &config);
    if let Err(e) = override_define_property(config.method_hooks(), ctx.clone()) {
        INSTALLED.with(|installed| installed.set(false));
        return Err(host_error(e));
    }

    let mut listeners = listeners::intent_listeners(&window, &ctx.guard);
    if config.enter_to_clear {
        listeners.push(listeners::enter_to_clear_listener(&window, &config, &ctx));
    }

    tracing::info!(
        policy = ?config.policy,
        insert = %config.insert_method,
        delete = %config.delete_method,
        "truncation guard installed"
    );

    Ok(Installation {
        ctx,
        _listeners: listeners,
    })
}

fn override_define_property(hooks: MethodHooks, ctx: HookContext) -> Result<(), JsValue> {
    let object = Reflect::get(&js_sys::global(), &JsValue::from_str("Object"))?;
    let define_key = JsValue::from_str("defineProperty");
    let original: Function = Reflect::get(&object, &define_key)?.dyn_into()?;

    let receiver = object.clone();
    let value_key = JsValue::from_str("value");
    let hook = Closure::wrap(Box::new(
        move |target: JsValue, prop: JsValue, descriptor: JsValue| -> Result<JsValue, JsValue> {
            let kind = prop.as_string().and_then(|name| hooks.resolve(&name));
            if let Some(kind) = kind {
                if descriptor.is_object() {
                    let method = Reflect::get(&descriptor, &value_key)?;
                    if let Ok(method) = method.dyn_into::<Function>() {
                        tracing::debug!(?kind, "wrapping host method");
                        let wrapped = hook_method(kind, method, &ctx);
                        Reflect::set(&descriptor, &value_key, &wrapped)?;
                    }
                }
            }
            original.call3(&receiver, &target, &prop, &descriptor)
        },
    )
        as Box<dyn Fn(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

    Reflect::set(&object, &define_key, hook.as_ref())?;
    hook.forget();
    Ok(())
}
