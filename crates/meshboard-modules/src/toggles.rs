//! Per-event notification toggles shared by the dispatchers.

use serde_json::Value;

use meshboard_core::events::EventKind;

/// Settings key of the per-event enable toggle, if the event type has
/// one. Test pings bypass toggles.
pub(crate) fn toggle_key(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::DeviceConnect => Some("notifyDeviceConnect"),
        EventKind::DeviceDisconnect => Some("notifyDeviceDisconnect"),
        EventKind::UserLogin => Some("notifyUserLogin"),
        EventKind::UserLoginFail => Some("notifyLoginFail"),
        EventKind::SupportRequest => Some("notifySupportRequest"),
        EventKind::Test | EventKind::Other(_) => None,
    }
}

/// Whether the given event type is individually enabled in `settings`.
/// Events without a toggle (test pings, unmapped types) pass.
pub(crate) fn event_enabled(settings: &Value, kind: &EventKind) -> bool {
    match toggle_key(kind) {
        Some(key) => settings.get(key).and_then(Value::as_bool).unwrap_or(false),
        None => true,
    }
}
