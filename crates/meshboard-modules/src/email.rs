//! Email notification dispatcher.
//!
//! Delivers through an HTTP mail relay rather than speaking SMTP
//! directly: the relay URL receives a JSON message per recipient,
//! authorized with a bearer key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use meshboard_core::error::AppError;
use meshboard_core::events::{CanonicalEvent, EventKind};
use meshboard_core::result::AppResult;
use meshboard_module::contract::{ActionDescriptor, DeliveryResult, HandleOutcome, Module};
use meshboard_module::schema::{Field, Schema};
use meshboard_store::SettingsStore;

use crate::quiet_hours::QuietHours;
use crate::template;
use crate::toggles;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The `email` feature module.
pub struct EmailModule {
    store: Arc<SettingsStore>,
    http: reqwest::Client,
}

impl EmailModule {
    /// Creates the module bound to the settings store.
    pub fn new(store: Arc<SettingsStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { store, http }
    }

    fn recipients(settings: &Value) -> Vec<String> {
        match settings.get("recipients") {
            Some(Value::Array(addresses)) => addresses
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
            // Textarea form: one address per line.
            Some(Value::String(lines)) => lines
                .lines()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn quiet_hours_active(settings: &Value) -> bool {
        if !settings
            .get("quietHoursEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return false;
        }
        let start = settings
            .get("quietHoursStart")
            .and_then(Value::as_str)
            .unwrap_or("");
        let end = settings
            .get("quietHoursEnd")
            .and_then(Value::as_str)
            .unwrap_or("");
        match QuietHours::parse(start, end) {
            Some(window) => window.active_now(),
            None => {
                warn!(start, end, "Unparsable quiet hours window, ignoring");
                false
            }
        }
    }

    fn subject_for(settings: &Value, event: &CanonicalEvent) -> String {
        let template = settings
            .get("subjects")
            .and_then(|s| s.get(event.event_type.as_str()))
            .and_then(Value::as_str)
            .unwrap_or("[Meshboard] {eventType}");
        template::render(template, &event.template_fields())
    }

    fn body_for(settings: &Value, event: &CanonicalEvent) -> String {
        let template = settings
            .get("templates")
            .and_then(|t| t.get(event.event_type.as_str()))
            .and_then(Value::as_str)
            .unwrap_or("Event {eventType} for {deviceName} at {timestamp}");
        template::render(template, &event.template_fields())
    }

    async fn send(
        &self,
        relay_url: &str,
        api_key: &str,
        from: &str,
        to: &str,
        subject: &str,
        text: &str,
    ) -> AppResult<()> {
        let mut request = self.http.post(relay_url).json(&json!({
            "from": from,
            "to": to,
            "subject": subject,
            "text": text,
        }));
        if !api_key.is_empty() {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("Mail relay request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::delivery(format!(
                "Mail relay returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn deliver_to_all(
        &self,
        settings: &Value,
        subject: &str,
        text: &str,
    ) -> Vec<DeliveryResult> {
        let relay_url = settings
            .get("relayUrl")
            .and_then(Value::as_str)
            .unwrap_or("");
        let api_key = settings.get("apiKey").and_then(Value::as_str).unwrap_or("");
        let from = settings
            .get("fromAddress")
            .and_then(Value::as_str)
            .unwrap_or("meshboard@localhost");

        let recipients = Self::recipients(settings);
        let mut results = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let result = match self
                .send(relay_url, api_key, from, &recipient, subject, text)
                .await
            {
                Ok(()) => DeliveryResult::ok(recipient),
                Err(e) => DeliveryResult::failed(recipient, e.to_string()),
            };
            results.push(result);
        }
        results
    }
}

#[async_trait]
impl Module for EmailModule {
    fn name(&self) -> &str {
        "email"
    }

    fn display_name(&self) -> &str {
        "Email Notifications"
    }

    fn description(&self) -> &str {
        "Sends platform events as email through an HTTP mail relay"
    }

    fn icon(&self) -> &str {
        "envelope"
    }

    fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    fn default_settings(&self) -> Value {
        json!({
            "enabled": false,
            "relayUrl": "",
            "apiKey": "",
            "fromAddress": "meshboard@localhost",
            "recipients": [],
            "notifyDeviceConnect": false,
            "notifyDeviceDisconnect": true,
            "notifyUserLogin": false,
            "notifyLoginFail": true,
            "notifySupportRequest": true,
            "quietHoursEnabled": false,
            "quietHoursStart": "22:00",
            "quietHoursEnd": "08:00",
            "subjects": {
                "device.connect": "[Meshboard] {deviceName} connected",
                "device.disconnect": "[Meshboard] {deviceName} disconnected",
                "user.login": "[Meshboard] Login by {userName}",
                "user.loginfail": "[Meshboard] Failed login for {userName}",
                "support.request": "[Meshboard] Support request from {userName}",
                "test": "[Meshboard] Test notification"
            },
            "templates": {
                "device.connect": "{deviceName} connected from {ipAddress} at {timestamp}.",
                "device.disconnect": "{deviceName} disconnected at {timestamp}.",
                "user.login": "{userName} logged in from {ipAddress} at {timestamp}.",
                "user.loginfail": "Failed login for {userName} from {ipAddress} at {timestamp}.",
                "support.request": "{userName} requested help: {message}",
                "test": "This is a test notification from Meshboard."
            }
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::boolean("enabled", "Enabled"),
            Field::section("Relay"),
            Field::text("relayUrl", "Relay URL")
                .placeholder("https://mail-relay.example.com/send"),
            Field::password("apiKey", "API Key"),
            Field::text("fromAddress", "From Address"),
            Field::textarea("recipients", "Recipients").describe("One address per line"),
            Field::section("Events"),
            Field::boolean("notifyDeviceConnect", "Device Connect"),
            Field::boolean("notifyDeviceDisconnect", "Device Disconnect"),
            Field::boolean("notifyUserLogin", "User Login"),
            Field::boolean("notifyLoginFail", "Failed Login"),
            Field::boolean("notifySupportRequest", "Support Request"),
            Field::section("Quiet Hours"),
            Field::boolean("quietHoursEnabled", "Enable Quiet Hours"),
            Field::time("quietHoursStart", "Start").pattern(r"^$|^\d{2}:\d{2}$"),
            Field::time("quietHoursEnd", "End").pattern(r"^$|^\d{2}:\d{2}$"),
        ])
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new("sendTest", "Send Test Email", "envelope")
                .describe("Delivers a test email to every configured recipient"),
        ]
    }

    fn handled_events(&self) -> Vec<EventKind> {
        vec![
            EventKind::DeviceConnect,
            EventKind::DeviceDisconnect,
            EventKind::UserLogin,
            EventKind::UserLoginFail,
            EventKind::SupportRequest,
            EventKind::Test,
        ]
    }

    async fn execute_action(&self, action: &str, _params: Value, actor: &str) -> AppResult<Value> {
        match action {
            "sendTest" => {
                let settings = self.settings().await?;
                debug!(actor = %actor, "Email test message requested");

                if settings
                    .get("relayUrl")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .is_empty()
                {
                    return Err(AppError::module("Mail relay URL is not configured"));
                }
                if Self::recipients(&settings).is_empty() {
                    return Err(AppError::module("No email recipients configured"));
                }

                let event = CanonicalEvent::new(EventKind::Test);
                let subject = Self::subject_for(&settings, &event);
                let body = Self::body_for(&settings, &event);
                let results = self.deliver_to_all(&settings, &subject, &body).await;
                Ok(json!({ "results": results }))
            }
            other => Err(AppError::not_found(format!(
                "Module 'email' has no action '{other}'"
            ))),
        }
    }

    async fn handle_event(&self, event: &CanonicalEvent) -> AppResult<HandleOutcome> {
        let settings = self.settings().await?;

        if !settings
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return Ok(HandleOutcome::suppressed("module disabled"));
        }
        if !toggles::event_enabled(&settings, &event.event_type) {
            return Ok(HandleOutcome::suppressed(format!(
                "notifications for '{}' are disabled",
                event.event_type
            )));
        }
        if event.event_type != EventKind::Test && Self::quiet_hours_active(&settings) {
            return Ok(HandleOutcome::suppressed("quiet hours active"));
        }
        if settings
            .get("relayUrl")
            .and_then(Value::as_str)
            .unwrap_or("")
            .is_empty()
        {
            return Ok(HandleOutcome::suppressed("mail relay not configured"));
        }
        if Self::recipients(&settings).is_empty() {
            return Ok(HandleOutcome::suppressed("no recipients configured"));
        }

        let subject = Self::subject_for(&settings, event);
        let body = Self::body_for(&settings, event);
        let results = self.deliver_to_all(&settings, &subject, &body).await;
        Ok(HandleOutcome::delivered(results))
    }
}
