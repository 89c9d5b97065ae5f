//! Bounded FIFO event log kept inside the events module's namespace.

use serde_json::{Value, json};

use meshboard_core::events::CanonicalEvent;

/// Default cap when `maxLogEntries` is unset or invalid.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Truncation limit for the stored payload copy.
const PAYLOAD_MAX_CHARS: usize = 500;

/// Builds a log entry `{timestamp, eventType, summary, payload}` with a
/// truncated payload copy.
pub fn entry(event: &CanonicalEvent) -> Value {
    let payload = serde_json::to_string(&event.raw).unwrap_or_default();
    let truncated: String = payload.chars().take(PAYLOAD_MAX_CHARS).collect();

    json!({
        "timestamp": event.timestamp.to_rfc3339(),
        "eventType": event.event_type.to_string(),
        "summary": summarize(event),
        "payload": truncated,
    })
}

/// Appends to the ring buffer, evicting oldest entries first once `max`
/// is exceeded.
pub fn push(log: &mut Value, entry: Value, max: usize) {
    if !log.is_array() {
        *log = json!([]);
    }
    let entries = log.as_array_mut().unwrap();
    entries.push(entry);
    let max = max.max(1);
    while entries.len() > max {
        entries.remove(0);
    }
}

fn summarize(event: &CanonicalEvent) -> String {
    let p = &event.payload;
    let subject = p
        .device_name
        .as_deref()
        .or(p.user_name.as_deref())
        .unwrap_or("unknown");
    match &p.ip_address {
        Some(ip) => format!("{} — {subject} ({ip})", event.event_type),
        None => format!("{} — {subject}", event.event_type),
    }
}
