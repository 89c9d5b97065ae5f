//! # meshboard-modules
//!
//! The built-in feature modules: Telegram, email-relay, and
//! outgoing-webhook notification dispatchers, plus the settings-only
//! branding module. Each implements the [`meshboard_module::Module`]
//! contract; shared delivery concerns (message templating, quiet hours,
//! per-event toggles) live in the helper modules here.

pub mod branding;
pub mod email;
pub mod quiet_hours;
pub mod telegram;
pub mod template;
pub mod webhooks;

mod toggles;

use std::sync::Arc;

use meshboard_module::Module;
use meshboard_store::SettingsStore;

/// The fixed, ordered list of built-in feature modules (the gateway
/// module from `meshboard-ingest` is appended by the server wiring).
pub fn available_modules(store: &Arc<SettingsStore>) -> Vec<Arc<dyn Module>> {
    vec![
        Arc::new(telegram::TelegramModule::new(Arc::clone(store))),
        Arc::new(email::EmailModule::new(Arc::clone(store))),
        Arc::new(webhooks::WebhookModule::new(Arc::clone(store))),
        Arc::new(branding::BrandingModule::new(Arc::clone(store))),
    ]
}
