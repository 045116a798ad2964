//! truncguard-core: truncation guard logic without browser dependencies.
//!
//! This crate provides:
//! - `ShadowTable` - per-instance document length, kept incrementally
//! - `IntentSignals` - recent user intent and the manual-clear flag
//! - `Classifier` - the allow/block decision for host delete calls
//! - `Guard` / `Guarded` - the engine and a decorator over Rust-side editors
//! - `MethodHooks` - by-name selection of the primitives to intercept
//! - `EnterToClear` - deferred programmatic clear on plain Enter
//!
//! Everything here runs on a single UI thread and is generic over the
//! instance key, clock and scheduler, so the browser layer only supplies
//! those three.

pub mod classify;
pub mod clear;
pub mod config;
pub mod error;
pub mod guard;
pub mod intercept;
pub mod shadow;
pub mod signals;

#[cfg(test)]
mod testing;

pub use classify::{AllowReason, Classifier, DeleteRequest, Policy, Verdict};
pub use clear::{ClearTarget, EnterToClear, KeyPress, Modifiers, Scheduler};
pub use config::GuardConfig;
pub use error::GuardError;
pub use guard::{EditorMethods, Guard, Guarded, SharedGuard};
pub use intercept::{HookKind, MethodHooks};
pub use shadow::{Payload, ShadowTable};
pub use signals::{Clock, IntentSignals, SignalSnapshot, SystemClock, UserEvent};
