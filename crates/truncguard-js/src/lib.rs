//! WASM entry point for the truncation guard.
//!
//! Loading the module installs the guard. A page (or the userscript that
//! loads this module) may set `globalThis.truncguardConfig` beforehand to a
//! partial [`GuardConfig`] object; anything missing or invalid falls back to
//! the defaults.

use std::cell::RefCell;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;

use truncguard_browser::Installation;
use truncguard_core::GuardConfig;

/// Global the configuration is read from.
const CONFIG_GLOBAL: &str = "truncguardConfig";

thread_local! {
    static INSTALLATION: RefCell<Option<Installation>> = const { RefCell::new(None) };
}

/// Install the panic hook, logging and the guard.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    init_tracing();

    match truncguard_browser::install(config_from_global()) {
        Ok(installation) => {
            INSTALLATION.with(|slot| *slot.borrow_mut() = Some(installation));
        }
        Err(e) => tracing::warn!(%e, "truncation guard not installed"),
    }
}

fn init_tracing() {
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = set_global_default(Registry::default().with(wasm_layer));
}

fn config_from_global() -> GuardConfig {
    let raw = Reflect::get(&js_sys::global(), &JsValue::from_str(CONFIG_GLOBAL))
        .unwrap_or(JsValue::UNDEFINED);
    if raw.is_undefined() || raw.is_null() {
        return GuardConfig::default();
    }

    let config: GuardConfig = match serde_wasm_bindgen::from_value(raw) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(%e, "unreadable {CONFIG_GLOBAL}, using defaults");
            return GuardConfig::default();
        }
    };
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            tracing::warn!(%e, "rejected {CONFIG_GLOBAL}, using defaults");
            GuardConfig::default()
        }
    }
}

/// Whether the guard is active on this page.
#[wasm_bindgen(js_name = isInstalled)]
pub fn is_installed() -> bool {
    INSTALLATION.with(|slot| slot.borrow().is_some())
}
