//! Module registry: loads, looks up, and dispatches across all feature
//! modules.
//!
//! Loading is failure-isolated: one module failing to register or
//! initialize never aborts the others; it is simply absent from the
//! registry and reported in the returned failure list. Event dispatch
//! is equally isolated per module.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use meshboard_core::error::AppError;
use meshboard_core::events::CanonicalEvent;
use meshboard_core::result::AppResult;
use meshboard_store::SettingsStore;

use crate::contract::{HandleOutcome, Module, ModuleInfo};

/// One module that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    /// The module identifier.
    pub module: String,
    /// Why loading failed.
    pub error: String,
}

/// A module's slot in a dispatch report: its outcome, or the captured
/// error that occupied only this slot.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DispatchSlot {
    /// The module handled (or suppressed) the event.
    Outcome(HandleOutcome),
    /// The module's handler failed; siblings were still delivered to.
    Error {
        /// The captured error message.
        error: String,
    },
}

/// Per-module results of fanning one event out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// The canonical event type that was dispatched.
    pub event_type: String,
    /// Module name → result slot, for every subscribed enabled module.
    pub results: BTreeMap<String, DispatchSlot>,
}

/// In-memory registry of loaded modules, keyed by name, held for the
/// process lifetime.
pub struct ModuleRegistry {
    store: Arc<SettingsStore>,
    /// Load order is dispatch order.
    modules: RwLock<Vec<Arc<dyn Module>>>,
}

impl ModuleRegistry {
    /// Creates an empty registry bound to the settings store.
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self {
            store,
            modules: RwLock::new(Vec::new()),
        }
    }

    /// The settings store modules persist through.
    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    /// Loads every module in order, independently.
    ///
    /// Failures are collected and returned, never thrown: a module that
    /// fails to load is absent from the registry, its features
    /// unavailable rather than crash-inducing.
    pub async fn load_all(&self, modules: Vec<Arc<dyn Module>>) -> Vec<LoadFailure> {
        let mut failures = Vec::new();
        for module in modules {
            let name = module.name().to_string();
            if let Err(e) = self.load(module).await {
                warn!(module = %name, error = %e, "Module failed to load");
                failures.push(LoadFailure {
                    module: name,
                    error: e.to_string(),
                });
            }
        }
        failures
    }

    /// Registers a module's defaults into the store, runs its `init`,
    /// and stores the instance. Loading a name twice replaces the prior
    /// instance (used by [`ModuleRegistry::reload`]).
    pub async fn load(&self, module: Arc<dyn Module>) -> AppResult<()> {
        let name = module.name().to_string();

        self.store
            .register_module(&name, module.default_settings())
            .await?;
        module.init().await?;

        let mut modules = self.modules.write().await;
        match modules.iter().position(|m| m.name() == name) {
            Some(index) => modules[index] = module,
            None => modules.push(module),
        }
        info!(module = %name, "Module loaded");
        Ok(())
    }

    /// Re-runs registration and init for one loaded module without a
    /// process restart. Idempotent.
    pub async fn reload(&self, name: &str) -> AppResult<()> {
        let module = self.get(name).await?;
        self.load(module).await
    }

    /// Whether a module is loaded.
    pub async fn has(&self, name: &str) -> bool {
        self.modules.read().await.iter().any(|m| m.name() == name)
    }

    /// Looks up a loaded module. Callers for which absence is expected
    /// should check [`ModuleRegistry::has`] first.
    pub async fn get(&self, name: &str) -> AppResult<Arc<dyn Module>> {
        self.modules
            .read()
            .await
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Module '{name}' not found")))
    }

    /// Metadata for every loaded module, without settings (no secret
    /// leakage through list views).
    pub async fn module_list(&self) -> Vec<ModuleInfo> {
        let modules = self.modules.read().await.clone();
        let mut infos = Vec::with_capacity(modules.len());
        for module in modules {
            infos.push(module.info().await);
        }
        infos
    }

    /// Executes a named action on a module.
    pub async fn execute_action(
        &self,
        module_name: &str,
        action: &str,
        params: Value,
        actor: &str,
    ) -> AppResult<Value> {
        let module = self.get(module_name).await?;
        if module.actions().is_empty() {
            return Err(AppError::module(format!(
                "Module '{module_name}' does not support actions"
            )));
        }
        debug!(module = %module_name, action = %action, actor = %actor, "Executing action");
        module.execute_action(action, params, actor).await
    }

    /// Fans one canonical event out to every subscribed, enabled module.
    ///
    /// Each module runs inside isolated error handling: a handler error
    /// is captured into that module's result slot and does not prevent
    /// delivery to the remaining modules.
    pub async fn handle_webhook(&self, event: &CanonicalEvent) -> DispatchReport {
        let modules = self.modules.read().await.clone();
        let mut results = BTreeMap::new();

        for module in modules {
            if !module.handled_events().contains(&event.event_type) {
                continue;
            }
            if !module.is_enabled().await {
                debug!(module = %module.name(), event = %event.event_type, "Module disabled, skipping");
                continue;
            }

            let slot = match module.handle_event(event).await {
                Ok(outcome) => DispatchSlot::Outcome(outcome),
                Err(e) => {
                    error!(module = %module.name(), event = %event.event_type, error = %e,
                        "Event handler failed");
                    DispatchSlot::Error {
                        error: e.to_string(),
                    }
                }
            };
            results.insert(module.name().to_string(), slot);
        }

        DispatchReport {
            event_type: event.event_type.to_string(),
            results,
        }
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry").finish_non_exhaustive()
    }
}
