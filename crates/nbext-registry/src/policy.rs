//! Enable-state policy: how enable/disable intents map to stored values.

use std::cmp::Ordering;

use serde_json::{json, Value};

use crate::{version_compare, RegistryError};

/// Hosts older than this ignore an explicit `false` in `load_extensions`.
pub const EXPLICIT_FALSE_MIN_VERSION: &str = "4.2";

/// An extension counts as enabled only when its `load_extensions` entry is exactly `true`.
pub fn resolve_enabled(section_data: &Value, require: &str) -> bool {
    section_data
        .get("load_extensions")
        .and_then(|load_extensions| load_extensions.get(require))
        == Some(&Value::Bool(true))
}

/// Returns the value to store for `desired`; `None` means "remove the key".
///
/// The host version is validated before anything else so an unparseable
/// version aborts the action without touching stored state.
pub fn compute_store_value(
    desired: bool,
    host_version: &str,
) -> Result<Option<bool>, RegistryError> {
    let honors_false =
        version_compare(host_version, EXPLICIT_FALSE_MIN_VERSION)? != Ordering::Less;
    Ok(match (desired, honors_false) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// User actions that change an extension's `load_extensions` entry.
pub enum EnableTransition {
    Enable,
    Disable,
    /// Drops the key entirely; only meaningful for unconfigurable stubs.
    Forget,
}

impl EnableTransition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Forget => "forget",
        }
    }

    pub fn store_value(self, host_version: &str) -> Result<Option<bool>, RegistryError> {
        match self {
            Self::Enable => compute_store_value(true, host_version),
            Self::Disable => compute_store_value(false, host_version),
            Self::Forget => Ok(None),
        }
    }
}

/// Builds the `{"load_extensions": {require: value}}` delta sent to the store.
pub fn load_extensions_delta(require: &str, value: Option<bool>) -> Value {
    let mut entries = serde_json::Map::new();
    entries.insert(
        require.to_string(),
        value.map(Value::Bool).unwrap_or(Value::Null),
    );
    json!({ "load_extensions": entries })
}
