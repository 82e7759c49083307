use serde_json::Value;

use crate::config::EngineConfig;
use crate::target::{KeyOverride, Target};
use crate::types::KeyDescriptor;

fn descriptor(v: &Value) -> Option<KeyDescriptor> {
    match v {
        Value::Object(map) if map.get("key").map_or(false, Value::is_string) => {
            serde_json::from_value(v.clone()).ok()
        }
        _ => None,
    }
}

/// Normalize a raw submit-key value: a single descriptor becomes a
/// one-element list, a list of descriptors is kept, anything else is empty.
pub fn normalize_keys(raw: &Value) -> Vec<KeyDescriptor> {
    if let Some(d) = descriptor(raw) {
        return vec![d];
    }
    match raw {
        Value::Array(items) if items.first().and_then(descriptor).is_some() => {
            items.iter().filter_map(descriptor).collect()
        }
        _ => Vec::new(),
    }
}

/// Submit keys for `target`: its own override when it has one, otherwise
/// the engine default.
pub fn resolve_submit_keys(target: &Target, config: &EngineConfig) -> Vec<KeyDescriptor> {
    match &target.submit_keys {
        KeyOverride::Disabled => Vec::new(),
        KeyOverride::Keys(keys) => keys.clone(),
        KeyOverride::Inherit => config.submit_keys.clone(),
    }
}

/// Literal text sent before the submit keys. An explicit empty string on the
/// target suppresses the engine default.
pub fn resolve_submit_text(target: &Target, config: &EngineConfig) -> Option<String> {
    target.submit_text.clone().or_else(|| config.submit_text.clone())
}
