//! The module contract: one polymorphic capability set for every
//! feature module.
//!
//! Shared behavior (settings read, validated save, enabled check) lives
//! in default trait methods over the injected settings store, so
//! individual modules only implement what actually differs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use meshboard_core::error::AppError;
use meshboard_core::events::{CanonicalEvent, EventKind};
use meshboard_core::result::AppResult;
use meshboard_store::SettingsStore;

use crate::schema::Schema;
use crate::validate;

/// A named operation a user can trigger from the settings UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    /// Stable action identifier, matched in `execute_action`.
    pub name: String,
    /// Button label.
    pub label: String,
    /// Icon name.
    pub icon: String,
    /// The caller must obtain explicit confirmation before invoking.
    #[serde(default)]
    pub confirm: bool,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionDescriptor {
    /// Creates an action descriptor.
    pub fn new(name: impl Into<String>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            icon: icon.into(),
            confirm: false,
            description: None,
        }
    }

    /// Requires explicit confirmation before invocation.
    pub fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }

    /// Sets the description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Outcome of one delivery attempt within a fan-out batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Recipient identifier (chat id, email address, endpoint name).
    pub recipient: String,
    /// Whether delivery succeeded.
    pub success: bool,
    /// Failure message when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    /// A successful delivery.
    pub fn ok(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            success: true,
            error: None,
        }
    }

    /// A failed delivery. The batch continues regardless.
    pub fn failed(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result of handing one canonical event to one module.
///
/// Suppression (module disabled, event toggle off, quiet hours, empty
/// recipient list) is reported through `handled: false` with a reason —
/// it is never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleOutcome {
    /// Whether the module acted on the event.
    pub handled: bool,
    /// Why delivery was suppressed, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Per-recipient delivery results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<DeliveryResult>,
}

impl HandleOutcome {
    /// The module delivered (or attempted) to the given recipients.
    pub fn delivered(results: Vec<DeliveryResult>) -> Self {
        Self {
            handled: true,
            reason: None,
            results,
        }
    }

    /// Delivery was suppressed by a precondition.
    pub fn suppressed(reason: impl Into<String>) -> Self {
        Self {
            handled: false,
            reason: Some(reason.into()),
            results: Vec::new(),
        }
    }
}

/// Metadata exposed by module list views. Never includes settings, so
/// secrets cannot leak through listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Unique, stable module identifier.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Short description.
    pub description: String,
    /// Icon name.
    pub icon: String,
    /// Derived from the module's own `enabled` setting.
    pub enabled: bool,
    /// Whether the module exposes actions.
    pub has_actions: bool,
    /// Canonical event types the module subscribes to.
    pub handled_events: Vec<EventKind>,
}

/// The uniform capability interface every feature module implements.
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique, stable identifier; also the settings namespace key.
    fn name(&self) -> &str;

    /// Human-readable name.
    fn display_name(&self) -> &str;

    /// Short description for list views.
    fn description(&self) -> &str {
        ""
    }

    /// Icon name for list views.
    fn icon(&self) -> &str {
        "puzzle"
    }

    /// The injected settings store this module persists through.
    fn store(&self) -> &Arc<SettingsStore>;

    /// The full default-settings shape for this module's namespace.
    fn default_settings(&self) -> Value;

    /// The ordered field schema rendered by the settings UI.
    fn schema(&self) -> Schema;

    /// Named operations the user can trigger.
    fn actions(&self) -> Vec<ActionDescriptor> {
        Vec::new()
    }

    /// Canonical event types this module wants delivered.
    fn handled_events(&self) -> Vec<EventKind> {
        Vec::new()
    }

    /// One-time initialization after defaults are registered. May
    /// perform side effects (e.g. generating a secret). Must be
    /// idempotent: `reload` re-runs it.
    async fn init(&self) -> AppResult<()> {
        Ok(())
    }

    /// Current settings for this module's namespace.
    async fn settings(&self) -> AppResult<Value> {
        self.store().get(self.name(), json!({})).await
    }

    /// Reads the module's own `enabled` setting; false by default.
    async fn is_enabled(&self) -> bool {
        match self.settings().await {
            Ok(settings) => settings
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Validates and persists a candidate settings object.
    ///
    /// Validation errors reject the whole save, carrying the structured
    /// field list; otherwise the candidate is shallow-merged over the
    /// current namespace (top level only) and persisted atomically.
    async fn save_settings(&self, candidate: Value) -> AppResult<Value> {
        let candidate_map = candidate
            .as_object()
            .ok_or_else(|| AppError::validation("Settings must be a JSON object"))?;

        let errors = validate::validate(&self.schema(), &candidate);
        if !errors.is_empty() {
            return Err(AppError::validation_fields(errors));
        }

        self.store()
            .update(self.name(), |current| {
                if !current.is_object() {
                    *current = json!({});
                }
                let map = current.as_object_mut().unwrap();
                for (key, value) in candidate_map {
                    map.insert(key.clone(), value.clone());
                }
            })
            .await
    }

    /// Dispatches a named action. The default rejects everything; a
    /// module with actions matches explicitly on the names it declared.
    async fn execute_action(&self, action: &str, _params: Value, _actor: &str) -> AppResult<Value> {
        Err(AppError::not_found(format!(
            "Module '{}' has no action '{action}'",
            self.name()
        )))
    }

    /// Handles a canonical event. Only invoked for event types present
    /// in [`Module::handled_events`].
    async fn handle_event(&self, _event: &CanonicalEvent) -> AppResult<HandleOutcome> {
        Ok(HandleOutcome::suppressed("event handling not implemented"))
    }

    /// Metadata for list views.
    async fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.name().to_string(),
            display_name: self.display_name().to_string(),
            description: self.description().to_string(),
            icon: self.icon().to_string(),
            enabled: self.is_enabled().await,
            has_actions: !self.actions().is_empty(),
            handled_events: self.handled_events(),
        }
    }
}

impl std::fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module").field("name", &self.name()).finish()
    }
}
