//! By-name method interception.
//!
//! The host defines its editor primitives through the page's generic
//! property-definition mechanism. Interception is point-wise: only the two
//! configured method names are wrapped, every other definition is passed
//! through untouched.

/// Which wrapper a method definition receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Insert,
    Delete,
}

/// The method names to intercept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodHooks {
    insert: String,
    delete: String,
}

impl MethodHooks {
    pub fn new(insert: &str, delete: &str) -> Self {
        Self {
            insert: insert.to_string(),
            delete: delete.to_string(),
        }
    }

    /// Resolve a property name to a hook, or `None` to pass it through.
    pub fn resolve(&self, prop: &str) -> Option<HookKind> {
        if prop == self.insert {
            Some(HookKind::Insert)
        } else if prop == self.delete {
            Some(HookKind::Delete)
        } else {
            None
        }
    }

    pub fn insert_name(&self) -> &str {
        &self.insert
    }

    pub fn delete_name(&self) -> &str {
        &self.delete
    }
}

impl Default for MethodHooks {
    fn default() -> Self {
        Self::new("insertAt", "deleteAt")
    }
}
