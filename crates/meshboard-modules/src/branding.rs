//! UI branding module. Settings-only: no event subscriptions, one
//! reset action.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use meshboard_core::error::AppError;
use meshboard_core::result::AppResult;
use meshboard_module::contract::{ActionDescriptor, Module};
use meshboard_module::schema::{Field, Schema};
use meshboard_store::SettingsStore;

/// The `branding` feature module.
pub struct BrandingModule {
    store: Arc<SettingsStore>,
}

impl BrandingModule {
    /// Creates the module bound to the settings store.
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BrandingModule {
    fn name(&self) -> &str {
        "branding"
    }

    fn display_name(&self) -> &str {
        "Branding"
    }

    fn description(&self) -> &str {
        "Customizes the portal title, logo, and colors"
    }

    fn icon(&self) -> &str {
        "palette"
    }

    fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    fn default_settings(&self) -> Value {
        json!({
            "enabled": true,
            "title": "Meshboard",
            "logoUrl": "",
            "loginMessage": "",
            "primaryColor": "#2b6cb0",
            "footerText": ""
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Field::boolean("enabled", "Enabled"),
            Field::text("title", "Portal Title").required().length(1, 64),
            Field::text("logoUrl", "Logo URL").placeholder("https://example.com/logo.png"),
            Field::textarea("loginMessage", "Login Message"),
            Field::color("primaryColor", "Primary Color").pattern(r"^#[0-9a-fA-F]{6}$"),
            Field::textarea("footerText", "Footer Text"),
        ])
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new("resetDefaults", "Reset to Defaults", "rotate-left")
                .confirmed()
                .describe("Restores the stock branding values"),
        ]
    }

    async fn execute_action(&self, action: &str, _params: Value, actor: &str) -> AppResult<Value> {
        match action {
            "resetDefaults" => {
                let defaults = self.default_settings();
                let restored = self
                    .store
                    .update(self.name(), |current| {
                        *current = defaults.clone();
                    })
                    .await?;
                info!(actor = %actor, "Branding reset to defaults");
                Ok(restored)
            }
            other => Err(AppError::not_found(format!(
                "Module 'branding' has no action '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn module() -> (BrandingModule, Arc<SettingsStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        store.init().await.unwrap();
        let module = BrandingModule::new(Arc::clone(&store));
        store
            .register_module(module.name(), module.default_settings())
            .await
            .unwrap();
        (module, store, dir)
    }

    #[tokio::test]
    async fn reset_restores_stock_values() {
        let (module, store, _dir) = module().await;
        store
            .update("branding", |ns| {
                ns["title"] = json!("Custom Portal");
                ns["primaryColor"] = json!("#ff0000");
            })
            .await
            .unwrap();

        let restored = module
            .execute_action("resetDefaults", json!({}), "admin")
            .await
            .unwrap();
        assert_eq!(restored["title"], "Meshboard");
        assert_eq!(restored["primaryColor"], "#2b6cb0");
    }

    #[tokio::test]
    async fn empty_title_fails_validation() {
        let (module, _store, _dir) = module().await;
        let err = module
            .save_settings(json!({"title": ""}))
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields[0].field, "title");
    }

    #[tokio::test]
    async fn bad_color_fails_pattern_validation() {
        let (module, _store, _dir) = module().await;
        let err = module
            .save_settings(json!({"title": "Meshboard", "primaryColor": "blue"}))
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.iter().any(|f| f.field == "primaryColor"));
    }
}
