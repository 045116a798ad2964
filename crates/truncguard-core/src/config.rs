//! Guard configuration.
//!
//! Field names are camelCase on the wire so a plain JS object can be handed
//! straight to `serde-wasm-bindgen`. Every field has a default, so partial
//! objects are fine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::Policy;
use crate::error::GuardError;
use crate::intercept::MethodHooks;

/// Runtime configuration for the guard and its helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuardConfig {
    /// Which events count as user intent and which exemptions apply.
    pub policy: Policy,
    /// How long a qualifying event authorizes deletions, in milliseconds.
    pub recent_window_ms: u32,
    /// Enable the Enter-to-clear helper.
    pub enter_to_clear: bool,
    /// Delay between a plain Enter and the programmatic clear.
    pub clear_delay_ms: u32,
    /// Delay before the manual-clear flag drops and the shadow length resets.
    pub clear_release_ms: u32,
    /// Longest deletion exempted under [`Policy::TypingFix`].
    pub short_edit_max: usize,
    /// Name of the host's insert primitive.
    pub insert_method: String,
    /// Name of the host's delete primitive.
    pub delete_method: String,
    /// Selector for the focusable editable element.
    pub editor_selector: String,
    /// Selector for the element carrying the editor handle.
    pub container_selector: String,
    /// Property on the container holding the editor handle.
    pub editor_handle_property: String,
    /// Property on the editor handle naming the root instance reset after a clear.
    pub root_property: String,
    /// Property on an instance read once when seeding its shadow length.
    pub text_property: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Strict,
            recent_window_ms: 200,
            enter_to_clear: true,
            clear_delay_ms: 100,
            clear_release_ms: 50,
            short_edit_max: 2,
            insert_method: "insertAt".to_string(),
            delete_method: "deleteAt".to_string(),
            editor_selector: ".ql-editor".to_string(),
            container_selector: ".ql-container".to_string(),
            editor_handle_property: "__quill".to_string(),
            root_property: "scroll".to_string(),
            text_property: "text".to_string(),
        }
    }
}

impl GuardConfig {
    /// Check the configuration for values that would make the guard useless.
    pub fn validate(&self) -> Result<(), GuardError> {
        if self.recent_window_ms == 0 {
            return Err(GuardError::InvalidConfig(
                "recentWindowMs must be greater than zero".to_string(),
            ));
        }
        if self.insert_method.is_empty() || self.delete_method.is_empty() {
            return Err(GuardError::InvalidConfig(
                "method names must not be empty".to_string(),
            ));
        }
        if self.insert_method == self.delete_method {
            return Err(GuardError::InvalidConfig(format!(
                "insert and delete method are both `{}`",
                self.insert_method
            )));
        }
        Ok(())
    }

    pub fn recent_window(&self) -> Duration {
        Duration::from_millis(self.recent_window_ms.into())
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms.into())
    }

    pub fn clear_release(&self) -> Duration {
        Duration::from_millis(self.clear_release_ms.into())
    }

    /// Method names to intercept, in the form the installer consumes.
    pub fn method_hooks(&self) -> MethodHooks {
        MethodHooks::new(&self.insert_method, &self.delete_method)
    }
}
