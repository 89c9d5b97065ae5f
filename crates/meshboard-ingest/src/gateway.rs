//! The `events` gateway module.
//!
//! Owns inbound webhook authentication, canonicalization, and the
//! bounded event log. The HTTP layer hands it raw body bytes plus the
//! supplied signature; it returns the canonical event ready for
//! registry dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use rand::RngCore;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use meshboard_core::error::AppError;
use meshboard_core::events::CanonicalEvent;
use meshboard_core::result::AppResult;
use meshboard_module::contract::{ActionDescriptor, Module};
use meshboard_module::schema::{Field, Schema};
use meshboard_store::SettingsStore;

use crate::log;
use crate::mapping::{EventMap, default_mappings};
use crate::normalize;
use crate::signature;

/// The `events` feature module: webhook ingestion gateway.
pub struct EventsModule {
    store: Arc<SettingsStore>,
}

impl EventsModule {
    /// Creates the gateway bound to the settings store.
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self { store }
    }

    /// Runs an inbound payload through Received → Authenticated →
    /// Canonicalized. Dispatch is the caller's job.
    pub async fn process(
        &self,
        body: &[u8],
        supplied_signature: Option<&str>,
    ) -> AppResult<CanonicalEvent> {
        if !self.is_enabled().await {
            return Err(AppError::module("Event gateway is disabled"));
        }
        let settings = self.settings().await?;

        self.authenticate(&settings, body, supplied_signature)?;

        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::validation(format!("Invalid JSON payload: {e}")))?;
        if !raw.is_object() {
            return Err(AppError::validation("Payload must be a JSON object"));
        }
        let action = raw
            .get("action")
            .or_else(|| raw.get("event"))
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::validation("Payload is missing an 'action' field"))?
            .to_string();

        let map = EventMap::from_settings(
            settings.get("eventMappings").unwrap_or(&Value::Null),
        );
        let event = normalize::normalize(map.resolve(&action), &raw);
        debug!(action = %action, event = %event.event_type, "Inbound event canonicalized");

        if settings
            .get("loggingEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(true)
        {
            self.append_log(&event, &settings).await?;
        }

        Ok(event)
    }

    /// Authenticates the raw body against the configured secret.
    ///
    /// With a secret configured and a signature supplied, the HMAC must
    /// match. A missing signature (or no configured secret) is accepted
    /// only while `authRequired` is false — the documented permissive
    /// default for internal-network deployments.
    fn authenticate(
        &self,
        settings: &Value,
        body: &[u8],
        supplied: Option<&str>,
    ) -> AppResult<()> {
        let secret = settings
            .get("incomingSecret")
            .and_then(Value::as_str)
            .unwrap_or("");
        let auth_required = settings
            .get("authRequired")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        match (secret.is_empty(), supplied) {
            (false, Some(signature)) => {
                if signature::verify(secret, body, signature) {
                    Ok(())
                } else {
                    Err(AppError::authentication("Invalid signature"))
                }
            }
            (false, None) if auth_required => {
                Err(AppError::authentication("Signature required"))
            }
            (true, _) if auth_required => Err(AppError::authentication(
                "Signature required but no incoming secret is configured",
            )),
            _ => {
                debug!("Accepting unauthenticated inbound event");
                Ok(())
            }
        }
    }

    async fn append_log(&self, event: &CanonicalEvent, settings: &Value) -> AppResult<()> {
        let max = settings
            .get("maxLogEntries")
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(log::DEFAULT_MAX_ENTRIES);
        let entry = log::entry(event);

        self.store
            .update(self.name(), move |ns| {
                if !ns.is_object() {
                    *ns = json!({});
                }
                let slot = ns
                    .as_object_mut()
                    .unwrap()
                    .entry("log")
                    .or_insert(json!([]));
                log::push(slot, entry, max);
            })
            .await?;
        Ok(())
    }

    async fn rotate_secret(&self) -> AppResult<String> {
        let secret = generate_secret();
        let stored = secret.clone();
        self.store
            .update(self.name(), move |ns| {
                ns["incomingSecret"] = json!(stored);
            })
            .await?;
        info!("Incoming webhook secret rotated");
        Ok(secret)
    }
}

#[async_trait]
impl Module for EventsModule {
    fn name(&self) -> &str {
        "events"
    }

    fn display_name(&self) -> &str {
        "Event Gateway"
    }

    fn description(&self) -> &str {
        "Receives platform webhooks, authenticates them, and relays canonical events to notification modules"
    }

    fn icon(&self) -> &str {
        "bolt"
    }

    fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    fn default_settings(&self) -> Value {
        json!({
            "enabled": true,
            "incomingSecret": "",
            "authRequired": false,
            "loggingEnabled": true,
            "maxLogEntries": log::DEFAULT_MAX_ENTRIES,
            "eventMappings": Value::Object(default_mappings()),
            "log": [],
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::boolean("enabled", "Enabled"),
            Field::section("Authentication"),
            Field::readonly("incomingSecret", "Incoming Webhook Secret")
                .secret()
                .describe("Configure this value in the platform's webhook settings"),
            Field::boolean("authRequired", "Require Signed Webhooks")
                .describe("Reject inbound events without a valid signature"),
            Field::section("Logging"),
            Field::boolean("loggingEnabled", "Log Processed Events"),
            Field::number("maxLogEntries", "Max Log Entries").range(1.0, 1000.0),
        ])
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new("generateSecret", "Rotate Secret", "key")
                .confirmed()
                .describe("Generates a new incoming webhook secret; the platform side must be updated"),
            ActionDescriptor::new("clearLog", "Clear Event Log", "trash").confirmed(),
        ]
    }

    /// Generates the incoming secret on first start. Safe to re-run: an
    /// existing secret is left alone.
    async fn init(&self) -> AppResult<()> {
        let settings = self.settings().await?;
        let missing = settings
            .get("incomingSecret")
            .and_then(Value::as_str)
            .map(str::is_empty)
            .unwrap_or(true);
        if missing {
            self.rotate_secret().await?;
        }
        Ok(())
    }

    async fn execute_action(&self, action: &str, _params: Value, actor: &str) -> AppResult<Value> {
        match action {
            "generateSecret" => {
                warn!(actor = %actor, "Webhook secret rotation requested");
                let secret = self.rotate_secret().await?;
                Ok(json!({ "secret": secret }))
            }
            "clearLog" => {
                self.store
                    .update(self.name(), |ns| {
                        ns["log"] = json!([]);
                    })
                    .await?;
                Ok(json!({ "cleared": true }))
            }
            other => Err(AppError::not_found(format!(
                "Module 'events' has no action '{other}'"
            ))),
        }
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn gateway() -> (EventsModule, Arc<SettingsStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        store.init().await.unwrap();

        let module = EventsModule::new(Arc::clone(&store));
        store
            .register_module(module.name(), module.default_settings())
            .await
            .unwrap();
        module.init().await.unwrap();
        (module, store, dir)
    }

    async fn secret_of(store: &SettingsStore) -> String {
        store
            .get("events", json!({}))
            .await
            .unwrap()
            .get("incomingSecret")
            .and_then(Value::as_str)
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn init_generates_a_secret_once() {
        let (module, store, _dir) = gateway().await;
        let first = secret_of(&store).await;
        assert_eq!(first.len(), 64);

        module.init().await.unwrap();
        assert_eq!(secret_of(&store).await, first);
    }

    #[tokio::test]
    async fn signed_payload_is_accepted_and_canonicalized() {
        let (module, store, _dir) = gateway().await;
        let secret = secret_of(&store).await;
        let body = br#"{"action":"serverConnect","nodename":"PC-1","ip":"10.0.0.5"}"#;
        let sig = signature::sign(&secret, body);

        let event = module.process(body, Some(&sig)).await.unwrap();
        assert_eq!(event.event_type.as_str(), "device.connect");
        assert_eq!(event.payload.device_name.as_deref(), Some("PC-1"));
        assert_eq!(event.payload.ip_address.as_deref(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let (module, _store, _dir) = gateway().await;
        let body = br#"{"action":"serverConnect"}"#;
        let sig = signature::sign("the-wrong-secret", body);

        let err = module.process(body, Some(&sig)).await.unwrap_err();
        assert_eq!(err.kind, meshboard_core::error::ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn unsigned_payload_accepted_unless_auth_required() {
        let (module, store, _dir) = gateway().await;
        let body = br#"{"action":"serverConnect","nodename":"PC-1"}"#;

        // Permissive default: no signature supplied, still accepted.
        assert!(module.process(body, None).await.is_ok());

        store
            .update("events", |ns| {
                ns["authRequired"] = json!(true);
            })
            .await
            .unwrap();
        let err = module.process(body, None).await.unwrap_err();
        assert_eq!(err.kind, meshboard_core::error::ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn malformed_payloads_are_validation_errors() {
        let (module, _store, _dir) = gateway().await;
        for body in [&b"not json"[..], br#"[1,2]"#, br#"{"nodename":"PC-1"}"#] {
            let err = module.process(body, None).await.unwrap_err();
            assert_eq!(err.kind, meshboard_core::error::ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn processed_events_land_in_the_bounded_log() {
        let (module, store, _dir) = gateway().await;
        store
            .update("events", |ns| {
                ns["maxLogEntries"] = json!(2);
            })
            .await
            .unwrap();

        for i in 0..4 {
            let body = format!(r#"{{"action":"serverConnect","nodename":"PC-{i}"}}"#);
            module.process(body.as_bytes(), None).await.unwrap();
        }

        let settings = store.get("events", json!({})).await.unwrap();
        let entries = settings["log"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1]["summary"].as_str().unwrap().contains("PC-3"));
    }

    #[tokio::test]
    async fn clear_log_action_empties_the_buffer() {
        let (module, store, _dir) = gateway().await;
        module
            .process(br#"{"action":"serverConnect","nodename":"PC-1"}"#, None)
            .await
            .unwrap();

        module
            .execute_action("clearLog", json!({}), "admin")
            .await
            .unwrap();
        let settings = store.get("events", json!({})).await.unwrap();
        assert!(settings["log"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_gateway_rejects_processing() {
        let (module, store, _dir) = gateway().await;
        store
            .update("events", |ns| {
                ns["enabled"] = json!(false);
            })
            .await
            .unwrap();
        let err = module
            .process(br#"{"action":"serverConnect"}"#, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, meshboard_core::error::ErrorKind::Module);
    }
}
