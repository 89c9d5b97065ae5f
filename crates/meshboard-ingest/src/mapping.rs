//! Platform action-name → canonical event-type mapping.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use meshboard_core::events::EventKind;

/// Built-in translations for the platform's native webhook action names.
pub fn default_mappings() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("serverConnect".into(), json!("device.connect"));
    map.insert("serverDisconnect".into(), json!("device.disconnect"));
    map.insert("nodeconnect".into(), json!("device.connect"));
    map.insert("nodedisconnect".into(), json!("device.disconnect"));
    map.insert("userlogin".into(), json!("user.login"));
    map.insert("userloginfail".into(), json!("user.loginfail"));
    map.insert("helpRequest".into(), json!("support.request"));
    map
}

/// A configurable action-name translation table.
///
/// Unmapped action names pass through unchanged as the canonical type,
/// so new platform events keep flowing without a code change.
#[derive(Debug, Clone)]
pub struct EventMap {
    table: HashMap<String, String>,
}

impl EventMap {
    /// The built-in table alone.
    pub fn with_defaults() -> Self {
        Self::from_settings(&Value::Null)
    }

    /// Built-in table overlaid with the `eventMappings` object from the
    /// events module settings. Non-string entries are ignored.
    pub fn from_settings(configured: &Value) -> Self {
        let mut table: HashMap<String, String> = default_mappings()
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect();

        if let Some(overrides) = configured.as_object() {
            for (action, target) in overrides {
                if let Some(target) = target.as_str() {
                    table.insert(action.clone(), target.to_string());
                }
            }
        }

        Self { table }
    }

    /// Translates a platform action name into a canonical event kind.
    pub fn resolve(&self, action: &str) -> EventKind {
        match self.table.get(action) {
            Some(canonical) => EventKind::from(canonical.as_str()),
            None => EventKind::from(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_actions_map_to_canonical_kinds() {
        let map = EventMap::with_defaults();
        assert_eq!(map.resolve("serverConnect"), EventKind::DeviceConnect);
        assert_eq!(map.resolve("nodedisconnect"), EventKind::DeviceDisconnect);
        assert_eq!(map.resolve("userloginfail"), EventKind::UserLoginFail);
        assert_eq!(map.resolve("helpRequest"), EventKind::SupportRequest);
    }

    #[test]
    fn unmapped_actions_pass_through() {
        let map = EventMap::with_defaults();
        assert_eq!(
            map.resolve("agentCoreDump"),
            EventKind::Other("agentCoreDump".into())
        );
    }

    #[test]
    fn configured_overrides_win_over_defaults() {
        let configured = json!({
            "serverConnect": "device.online",
            "customPing": "test",
            "broken": 42
        });
        let map = EventMap::from_settings(&configured);
        assert_eq!(
            map.resolve("serverConnect"),
            EventKind::Other("device.online".into())
        );
        assert_eq!(map.resolve("customPing"), EventKind::Test);
        assert_eq!(map.resolve("broken"), EventKind::Other("broken".into()));
    }
}
