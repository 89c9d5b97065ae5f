//! Application state shared across all handlers.

use std::sync::Arc;

use meshboard_core::config::AppConfig;
use meshboard_ingest::gateway::EventsModule;
use meshboard_module::registry::ModuleRegistry;
use meshboard_store::SettingsStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// The settings store
    pub store: Arc<SettingsStore>,
    /// Loaded feature modules
    pub registry: Arc<ModuleRegistry>,
    /// Inbound event gateway
    pub gateway: Arc<EventsModule>,
}
