//! Browser layer for the truncation guard.
//!
//! This crate wires `truncguard-core` into a live page. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `install`: one-time `Object.defineProperty` override
//! - `hooks`: receiver-aware wrappers around the host's insert/delete
//! - `instances`: `WeakMap`-backed keys for host objects
//! - `listeners`: capture-phase intent listeners and Enter-to-clear
//! - `host`: the editor container's full-clear surface
//! - `timers`: `setTimeout`-backed scheduler
//!
//! # Re-exports
//!
//! This crate re-exports `truncguard-core` for convenience, so consumers
//! only need to depend on `truncguard-browser`.

use wasm_bindgen::JsValue;

// Re-export core crate
pub use truncguard_core;
pub use truncguard_core::*;

pub mod hooks;
pub mod host;
pub mod install;
pub mod instances;
pub mod listeners;
pub mod timers;

pub use hooks::{HookContext, hook_method, payload_units, seed_length};
pub use host::ContainerClear;
pub use install::{Installation, install, is_installed};
pub use instances::{InstanceKey, InstanceKeys};
pub use timers::TimeoutScheduler;

/// Convert a thrown JS value into a guard error.
pub(crate) fn host_error(e: JsValue) -> GuardError {
    GuardError::Host(format!("{e:?}"))
}
