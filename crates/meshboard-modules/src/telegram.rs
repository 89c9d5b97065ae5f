//! Telegram notification dispatcher.
//!
//! Supports a global bot credential with a shared chat-id list plus a
//! per-user credential map; every recipient is delivered to
//! independently and sequentially, so one slow or failing chat never
//! aborts the batch.

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

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// The `telegram` feature module.
pub struct TelegramModule {
    store: Arc<SettingsStore>,
    http: reqwest::Client,
}

impl TelegramModule {
    /// Creates the module bound to the settings store.
    pub fn new(store: Arc<SettingsStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { store, http }
    }

    /// Resolves the recipient list: shared chat ids first, then every
    /// per-user entry with notifications enabled.
    fn recipients(settings: &Value) -> Vec<Recipient> {
        let mut recipients = Vec::new();

        match settings.get("chatIds") {
            Some(Value::Array(ids)) => {
                for id in ids {
                    if let Some(chat_id) = scalar_string(id) {
                        recipients.push(Recipient {
                            label: format!("chat:{chat_id}"),
                            chat_id,
                            token: None,
                        });
                    }
                }
            }
            // Tolerate the textarea form: one chat id per line.
            Some(Value::String(lines)) => {
                for line in lines.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    recipients.push(Recipient {
                        label: format!("chat:{line}"),
                        chat_id: line.to_string(),
                        token: None,
                    });
                }
            }
            _ => {}
        }

        if let Some(users) = settings.get("users").and_then(Value::as_object) {
            for (user, entry) in users {
                let enabled = entry
                    .get("enabled")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let chat_id = entry.get("chatId").and_then(scalar_string);
                if enabled && let Some(chat_id) = chat_id {
                    // A per-user bot token overrides the global one.
                    let token = entry
                        .get("botToken")
                        .and_then(Value::as_str)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string);
                    recipients.push(Recipient {
                        label: format!("user:{user}"),
                        chat_id,
                        token,
                    });
                }
            }
        }

        recipients
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

    fn message_for(settings: &Value, event: &CanonicalEvent) -> String {
        let template = settings
            .get("templates")
            .and_then(|t| t.get(event.event_type.as_str()))
            .and_then(Value::as_str)
            .unwrap_or("{eventType}: {deviceName}");
        template::render(template, &event.template_fields())
    }

    async fn send(&self, base: &str, token: &str, chat_id: &str, text: &str) -> AppResult<()> {
        let url = format!("{base}/bot{token}/sendMessage");
        let response = self
            .http
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("Telegram request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::delivery(format!(
                "Telegram API returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn deliver_to_all(&self, settings: &Value, text: &str) -> Vec<DeliveryResult> {
        let base = settings
            .get("apiBase")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_BASE);
        let global_token = settings
            .get("botToken")
            .and_then(Value::as_str)
            .unwrap_or("");
        let recipients = Self::recipients(settings);

        // Sequential on purpose: a failing recipient is recorded and the
        // batch moves on.
        let mut results = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let token = recipient.token.as_deref().unwrap_or(global_token);
            let result = if token.is_empty() {
                DeliveryResult::failed(recipient.label, "no bot token for recipient")
            } else {
                match self.send(base, token, &recipient.chat_id, text).await {
                    Ok(()) => DeliveryResult::ok(recipient.label),
                    Err(e) => DeliveryResult::failed(recipient.label, e.to_string()),
                }
            };
            results.push(result);
        }
        results
    }
}

struct Recipient {
    label: String,
    chat_id: String,
    token: Option<String>,
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Module for TelegramModule {
    fn name(&self) -> &str {
        "telegram"
    }

    fn display_name(&self) -> &str {
        "Telegram Notifications"
    }

    fn description(&self) -> &str {
        "Sends platform events to Telegram chats via a bot"
    }

    fn icon(&self) -> &str {
        "paper-plane"
    }

    fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    fn default_settings(&self) -> Value {
        json!({
            "enabled": false,
            "apiBase": DEFAULT_API_BASE,
            "botToken": "",
            "chatIds": [],
            "users": {},
            "notifyDeviceConnect": true,
            "notifyDeviceDisconnect": true,
            "notifyUserLogin": false,
            "notifyLoginFail": true,
            "notifySupportRequest": true,
            "quietHoursEnabled": false,
            "quietHoursStart": "22:00",
            "quietHoursEnd": "08:00",
            "templates": {
                "device.connect": "🟢 {deviceName} connected ({ipAddress})",
                "device.disconnect": "🔴 {deviceName} disconnected",
                "user.login": "👤 {userName} logged in from {ipAddress}",
                "user.loginfail": "⚠️ Failed login for {userName} from {ipAddress}",
                "support.request": "🆘 {userName} needs help: {message}",
                "test": "Test notification from Meshboard"
            }
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::boolean("enabled", "Enabled"),
            Field::section("Bot"),
            Field::password("botToken", "Bot Token")
                .pattern(r"^$|^\d+:[A-Za-z0-9_-]+$")
                .describe("Token from @BotFather"),
            Field::textarea("chatIds", "Chat IDs").describe("One chat ID per line"),
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
            ActionDescriptor::new("sendTest", "Send Test Message", "paper-plane")
                .describe("Delivers a test message to every configured recipient"),
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

    async fn execute_action(&self, action: &str, params: Value, actor: &str) -> AppResult<Value> {
        match action {
            "sendTest" => {
                let settings = self.settings().await?;
                let text = params
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Test notification from Meshboard");
                debug!(actor = %actor, "Telegram test message requested");

                if Self::recipients(&settings).is_empty() {
                    return Err(AppError::module("No Telegram recipients configured"));
                }
                let results = self.deliver_to_all(&settings, text).await;
                Ok(json!({ "results": results }))
            }
            other => Err(AppError::not_found(format!(
                "Module 'telegram' has no action '{other}'"
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
        let recipients = Self::recipients(&settings);
        if recipients.is_empty() {
            return Ok(HandleOutcome::suppressed("no recipients configured"));
        }
        let global_token_missing = settings
            .get("botToken")
            .and_then(Value::as_str)
            .unwrap_or("")
            .is_empty();
        if global_token_missing && recipients.iter().all(|r| r.token.is_none()) {
            return Ok(HandleOutcome::suppressed("bot token not configured"));
        }

        let text = Self::message_for(&settings, event);
        let results = self.deliver_to_all(&settings, &text).await;
        Ok(HandleOutcome::delivered(results))
    }
}
