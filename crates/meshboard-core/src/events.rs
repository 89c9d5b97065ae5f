//! Canonical event types delivered to interested modules.
//!
//! Inbound platform events arrive with platform-specific action names
//! (`serverConnect`, `userlogin`, ...). The ingest layer translates them
//! into these canonical kinds; names it does not recognize pass through
//! as [`EventKind::Other`] so new platform events keep flowing without a
//! code change.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical event type, independent of the upstream platform's names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A device came online.
    DeviceConnect,
    /// A device went offline.
    DeviceDisconnect,
    /// A user logged in.
    UserLogin,
    /// A user login attempt failed.
    UserLoginFail,
    /// An end user asked for support.
    SupportRequest,
    /// A delivery test triggered from the settings UI.
    Test,
    /// An event type with no canonical mapping; carried as-is.
    Other(String),
}

impl EventKind {
    /// The canonical string form (`device.connect`, `support.request`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            Self::DeviceConnect => "device.connect",
            Self::DeviceDisconnect => "device.disconnect",
            Self::UserLogin => "user.login",
            Self::UserLoginFail => "user.loginfail",
            Self::SupportRequest => "support.request",
            Self::Test => "test",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "device.connect" => Self::DeviceConnect,
            "device.disconnect" => Self::DeviceDisconnect,
            "user.login" => Self::UserLogin,
            "user.loginfail" => Self::UserLoginFail,
            "support.request" => Self::SupportRequest,
            "test" => Self::Test,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

/// Best-effort normalized fields extracted from a raw platform payload.
///
/// The upstream platform uses inconsistent field names across event
/// types; the ingest layer folds them into this single shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    /// Device display name, if present in the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Platform device identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Remote IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Acting user name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Device group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Free-form message (support requests, test pings).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A normalized occurrence delivered to interested modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Canonical event type.
    pub event_type: EventKind,
    /// Normalized fields.
    pub payload: EventPayload,
    /// Always present; stamped at normalization time if the source
    /// carried no usable timestamp.
    pub timestamp: DateTime<Utc>,
    /// The original raw payload, retained for forward compatibility.
    pub raw: Value,
}

impl CanonicalEvent {
    /// Builds an event with an empty payload and the current timestamp.
    pub fn new(event_type: EventKind) -> Self {
        Self {
            event_type,
            payload: EventPayload::default(),
            timestamp: Utc::now(),
            raw: Value::Null,
        }
    }

    /// Flattens the event into template substitution fields.
    ///
    /// Normalized fields take precedence; top-level scalar keys of the
    /// raw payload are added underneath so templates can reach
    /// untranslated platform data.
    pub fn template_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();

        if let Value::Object(map) = &self.raw {
            for (key, value) in map {
                match value {
                    Value::String(s) => {
                        fields.insert(key.clone(), s.clone());
                    }
                    Value::Number(n) => {
                        fields.insert(key.clone(), n.to_string());
                    }
                    Value::Bool(b) => {
                        fields.insert(key.clone(), b.to_string());
                    }
                    _ => {}
                }
            }
        }

        let p = &self.payload;
        let normalized = [
            ("deviceName", &p.device_name),
            ("deviceId", &p.device_id),
            ("ipAddress", &p.ip_address),
            ("userName", &p.user_name),
            ("groupName", &p.group_name),
            ("message", &p.message),
        ];
        for (key, value) in normalized {
            if let Some(v) = value {
                fields.insert(key.to_string(), v.clone());
            }
        }

        fields.insert("eventType".to_string(), self.event_type.to_string());
        fields.insert("timestamp".to_string(), self.timestamp.to_rfc3339());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_string_round_trip() {
        for name in ["device.connect", "user.loginfail", "support.request"] {
            assert_eq!(EventKind::from(name).as_str(), name);
        }
        assert_eq!(
            EventKind::from("agent.coredump"),
            EventKind::Other("agent.coredump".into())
        );
    }

    #[test]
    fn template_fields_prefer_normalized_values() {
        let mut event = CanonicalEvent::new(EventKind::DeviceConnect);
        event.raw = json!({"nodename": "raw-name", "port": 443, "deviceName": "stale"});
        event.payload.device_name = Some("PC-1".into());

        let fields = event.template_fields();
        assert_eq!(fields["deviceName"], "PC-1");
        assert_eq!(fields["nodename"], "raw-name");
        assert_eq!(fields["port"], "443");
        assert_eq!(fields["eventType"], "device.connect");
    }
}
