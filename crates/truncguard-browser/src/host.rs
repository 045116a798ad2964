//! The host editor's full-clear surface.
//!
//! The editable container exposes its editor object through a property
//! (`__quill` by default). Clearing goes through that object's `setText`;
//! the helper raises the manual-clear flag around it so the deletes it
//! triggers are let through.

use std::rc::Rc;

use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use truncguard_core::{ClearTarget, GuardConfig, GuardError};

use crate::host_error;
use crate::instances::{InstanceKey, InstanceKeys};

/// Clears the editor found under the configured container.
pub struct ContainerClear {
    container_selector: String,
    handle_property: String,
    root_property: String,
    keys: Rc<InstanceKeys>,
}

impl ContainerClear {
    pub fn new(config: &GuardConfig, keys: Rc<InstanceKeys>) -> Self {
        Self {
            container_selector: config.container_selector.clone(),
            handle_property: config.editor_handle_property.clone(),
            root_property: config.root_property.clone(),
            keys,
        }
    }
}

impl ClearTarget<InstanceKey> for ContainerClear {
    type Editor = JsValue;

    fn locate(&self) -> Result<JsValue, GuardError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GuardError::ClearUnavailable("no document".to_string()))?;

        let container = document
            .query_selector(&self.container_selector)
            .map_err(host_error)?
            .ok_or_else(|| {
                GuardError::ClearUnavailable(format!(
                    "nothing matches `{}`",
                    self.container_selector
                ))
            })?;

        let editor =
            Reflect::get(&container, &JsValue::from_str(&self.handle_property)).map_err(host_error)?;
        if editor.is_undefined() || editor.is_null() {
            return Err(GuardError::ClearUnavailable(format!(
                "container has no `{}`",
                self.handle_property
            )));
        }
        Ok(editor)
    }

    fn clear(&self, editor: &JsValue) -> Result<(), GuardError> {
        let set_text: Function = Reflect::get(editor, &JsValue::from_str("setText"))
            .map_err(host_error)?
            .dyn_into()
            .map_err(|_| GuardError::Host("editor has no setText".to_string()))?;

        set_text
            .call1(editor, &JsValue::from_str(""))
            .map_err(host_error)?;
        Ok(())
    }

    fn root_key(&self, editor: &JsValue) -> Option<InstanceKey> {
        let root = Reflect::get(editor, &JsValue::from_str(&self.root_property)).ok()?;
        root.is_object().then(|| self.keys.key_for(&root))
    }
}
