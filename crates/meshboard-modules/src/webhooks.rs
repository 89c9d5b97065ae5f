//! Outgoing webhook dispatcher.
//!
//! Forwards canonical events to user-configured HTTP endpoints. Each
//! endpoint carries its own event filter and optional signing secret;
//! the JSON body is serialized once and the HMAC signature covers those
//! exact bytes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::debug;

use meshboard_core::error::{AppError, FieldError};
use meshboard_core::events::{CanonicalEvent, EventKind};
use meshboard_core::result::AppResult;
use meshboard_module::contract::{ActionDescriptor, DeliveryResult, HandleOutcome, Module};
use meshboard_module::schema::{Field, Schema};
use meshboard_module::validate;
use meshboard_store::SettingsStore;

type HmacSha256 = Hmac<Sha256>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HMAC-SHA256 over the exact serialized body, hex encoded.
fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// One configured delivery target.
#[derive(Debug, Clone)]
struct Endpoint {
    name: String,
    url: String,
    events: Vec<String>,
    secret: String,
}

impl Endpoint {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !obj.get("enabled").and_then(Value::as_bool).unwrap_or(true) {
            return None;
        }
        Some(Self {
            name: obj.get("name")?.as_str()?.to_string(),
            url: obj.get("url")?.as_str()?.to_string(),
            events: obj
                .get("events")
                .and_then(Value::as_array)
                .map(|events| {
                    events
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            secret: obj
                .get("secret")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        })
    }

    fn wants(&self, event_type: &str) -> bool {
        self.events.is_empty() || self.events.iter().any(|e| e == "*" || e == event_type)
    }
}

/// The `webhooks` feature module.
pub struct WebhookModule {
    store: Arc<SettingsStore>,
    http: reqwest::Client,
}

impl WebhookModule {
    /// Creates the module bound to the settings store.
    pub fn new(store: Arc<SettingsStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { store, http }
    }

    fn endpoints(settings: &Value) -> Vec<Endpoint> {
        settings
            .get("endpoints")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(Endpoint::from_value).collect())
            .unwrap_or_default()
    }

    /// Posts one serialized body to one endpoint, signing when a secret
    /// is configured.
    async fn post(&self, endpoint: &Endpoint, body: String) -> AppResult<()> {
        let mut request = self
            .http
            .post(&endpoint.url)
            .header("Content-Type", "application/json");
        if !endpoint.secret.is_empty() {
            let signature = format!("sha256={}", sign(&endpoint.secret, body.as_bytes()));
            request = request.header("X-Webhook-Signature", signature);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("Webhook request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::delivery(format!(
                "Endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn deliver(&self, endpoints: &[Endpoint], payload: &Value) -> Vec<DeliveryResult> {
        // One serialization shared by every endpoint, so the signature
        // always matches the bytes on the wire.
        let body = payload.to_string();

        let mut results = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let result = match self.post(endpoint, body.clone()).await {
                Ok(()) => DeliveryResult::ok(endpoint.name.clone()),
                Err(e) => DeliveryResult::failed(endpoint.name.clone(), e.to_string()),
            };
            results.push(result);
        }
        results
    }

    fn validate_endpoints(candidate: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let Some(entries) = candidate.get("endpoints") else {
            return errors;
        };
        let Some(entries) = entries.as_array() else {
            errors.push(FieldError::new("endpoints", "Endpoints must be an array"));
            return errors;
        };

        for (index, entry) in entries.iter().enumerate() {
            let field = format!("endpoints[{index}]");
            let Some(obj) = entry.as_object() else {
                errors.push(FieldError::new(field, "Endpoint must be an object"));
                continue;
            };
            if obj.get("name").and_then(Value::as_str).unwrap_or("").is_empty() {
                errors.push(FieldError::new(
                    format!("{field}.name"),
                    "Endpoint name is required",
                ));
            }
            let url = obj.get("url").and_then(Value::as_str).unwrap_or("");
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(FieldError::new(
                    format!("{field}.url"),
                    "Endpoint URL must start with http:// or https://",
                ));
            }
        }
        errors
    }
}

#[async_trait]
impl Module for WebhookModule {
    fn name(&self) -> &str {
        "webhooks"
    }

    fn display_name(&self) -> &str {
        "Outgoing Webhooks"
    }

    fn description(&self) -> &str {
        "Forwards platform events to external HTTP endpoints"
    }

    fn icon(&self) -> &str {
        "link"
    }

    fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    fn default_settings(&self) -> Value {
        json!({
            "enabled": false,
            "endpoints": []
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::boolean("enabled", "Enabled"),
            Field::section("Endpoints"),
            Field::readonly("endpoints", "Configured Endpoints")
                .describe("Managed through the endpoint editor"),
        ])
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new("testEndpoint", "Send Test Event", "link")
                .describe("Delivers a test payload to one named endpoint"),
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

    /// Adds per-endpoint structural validation on top of the schema
    /// rules before persisting.
    async fn save_settings(&self, candidate: Value) -> AppResult<Value> {
        let candidate_map = candidate
            .as_object()
            .ok_or_else(|| AppError::validation("Settings must be a JSON object"))?
            .clone();

        let mut errors = validate::validate(&self.schema(), &candidate);
        errors.extend(Self::validate_endpoints(&candidate));
        if !errors.is_empty() {
            return Err(AppError::validation_fields(errors));
        }

        self.store()
            .update(self.name(), |current| {
                if !current.is_object() {
                    *current = json!({});
                }
                if let Some(map) = current.as_object_mut() {
                    for (key, value) in &candidate_map {
                        map.insert(key.clone(), value.clone());
                    }
                }
            })
            .await
    }

    async fn execute_action(&self, action: &str, params: Value, actor: &str) -> AppResult<Value> {
        match action {
            "testEndpoint" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AppError::validation("Action requires an endpoint 'name'"))?;
                debug!(actor = %actor, endpoint = name, "Webhook test requested");

                let settings = self.settings().await?;
                let endpoint = Self::endpoints(&settings)
                    .into_iter()
                    .find(|e| e.name == name)
                    .ok_or_else(|| {
                        AppError::not_found(format!("No enabled endpoint named '{name}'"))
                    })?;

                let payload = json!({
                    "event": "test",
                    "message": "Test delivery from Meshboard",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                });
                let results = self.deliver(std::slice::from_ref(&endpoint), &payload).await;
                Ok(json!({ "results": results }))
            }
            other => Err(AppError::not_found(format!(
                "Module 'webhooks' has no action '{other}'"
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

        let matching: Vec<Endpoint> = Self::endpoints(&settings)
            .into_iter()
            .filter(|e| e.wants(event.event_type.as_str()))
            .collect();
        if matching.is_empty() {
            return Ok(HandleOutcome::suppressed("no matching endpoints"));
        }

        let payload = json!({
            "event": &event.event_type,
            "data": &event.payload,
            "timestamp": event.timestamp.to_rfc3339(),
        });
        let results = self.deliver(&matching, &payload).await;
        Ok(HandleOutcome::delivered(results))
    }
}
