//! Instance keys for host objects.
//!
//! Shadow lengths live in a Rust side-table, so every host object that calls
//! a hooked method needs a stable key. Keys are handed out lazily and kept in
//! a `WeakMap`, which neither touches the object's own properties nor keeps
//! it alive. When a release callback is given, each keyed object is also
//! registered with a `FinalizationRegistry` so its Rust-side entry goes away
//! once the host drops the object.

use std::cell::Cell;

use js_sys::{Function, Object, WeakMap};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    type FinalizationRegistry;

    #[wasm_bindgen(constructor)]
    fn new(cleanup: &Function) -> FinalizationRegistry;

    #[wasm_bindgen(method)]
    fn register(this: &FinalizationRegistry, target: &JsValue, held: &JsValue);
}

/// Opaque key for one host editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey(u32);

impl InstanceKey {
    /// Shared key for receivers that are not objects.
    pub const DETACHED: InstanceKey = InstanceKey(0);

    pub fn id(self) -> u32 {
        self.0
    }
}

/// Object → key side-table.
pub struct InstanceKeys {
    map: WeakMap,
    next: Cell<u32>,
    registry: Option<FinalizationRegistry>,
}

impl Default for InstanceKeys {
    fn default() -> Self {
        Self {
            map: WeakMap::new(),
            next: Cell::new(1),
            registry: None,
        }
    }
}

impl InstanceKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys whose objects report back through `on_release` once collected.
    pub fn with_release(on_release: impl Fn(InstanceKey) + 'static) -> Self {
        let cleanup = Closure::wrap(Box::new(move |held: JsValue| {
            if let Some(id) = held.as_f64() {
                on_release(InstanceKey(id as u32));
            }
        }) as Box<dyn Fn(JsValue)>);

        let registry = FinalizationRegistry::new(cleanup.as_ref().unchecked_ref());
        // Collection callbacks can arrive for as long as the page lives.
        cleanup.forget();

        Self {
            registry: Some(registry),
            ..Self::default()
        }
    }

    /// Key for `instance`, assigning a fresh one on first sight.
    pub fn key_for(&self, instance: &JsValue) -> InstanceKey {
        if !(instance.is_object() || instance.is_function()) {
            return InstanceKey::DETACHED;
        }
        let object: &Object = instance.unchecked_ref();

        if let Some(id) = self.map.get(object).as_f64() {
            return InstanceKey(id as u32);
        }

        let id = self.next.get();
        self.next.set(id.checked_add(1).unwrap_or(1));
        self.map.set(object, &JsValue::from(id));

        let key = InstanceKey(id);
        if let Some(registry) = &self.registry {
            registry.register(instance, &JsValue::from(key.id()));
        }
        key
    }
}
