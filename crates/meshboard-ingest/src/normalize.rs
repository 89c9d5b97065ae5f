//! Canonicalization of raw platform payloads.
//!
//! The upstream platform uses inconsistent field names across event
//! types, so extraction tries several source shapes per normalized
//! field. A timestamp is always stamped; the raw payload is retained
//! for modules that need untranslated data.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use meshboard_core::events::{CanonicalEvent, EventKind, EventPayload};

const DEVICE_NAME_KEYS: &[&str] = &["nodename", "name", "device", "computer"];
const DEVICE_ID_KEYS: &[&str] = &["nodeid", "id"];
const IP_KEYS: &[&str] = &["ip", "addr", "remoteaddr"];
const USER_KEYS: &[&str] = &["username", "user", "userid"];
const GROUP_KEYS: &[&str] = &["meshname", "group", "groupname"];
const MESSAGE_KEYS: &[&str] = &["msg", "message", "help", "text"];

/// Builds a canonical event from a raw platform payload.
pub fn normalize(event_type: EventKind, raw: &Value) -> CanonicalEvent {
    let payload = EventPayload {
        device_name: first_string(raw, DEVICE_NAME_KEYS),
        device_id: first_string(raw, DEVICE_ID_KEYS),
        ip_address: first_string(raw, IP_KEYS),
        user_name: first_string(raw, USER_KEYS),
        group_name: first_string(raw, GROUP_KEYS),
        message: first_string(raw, MESSAGE_KEYS),
    };

    CanonicalEvent {
        event_type,
        payload,
        timestamp: extract_timestamp(raw).unwrap_or_else(Utc::now),
        raw: raw.clone(),
    }
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    let map = raw.as_object()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
}

fn extract_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let map = raw.as_object()?;
    let value = map.get("time").or_else(|| map.get("timestamp"))?;
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        // Upstream sends epoch milliseconds.
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
