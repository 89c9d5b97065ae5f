//! Response DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use meshboard_module::contract::ActionDescriptor;
use meshboard_module::schema::Schema;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Full module detail: metadata plus schema and current settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetailResponse {
    /// Module identifier.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Short description.
    pub description: String,
    /// Icon name.
    pub icon: String,
    /// Ordered field schema for the settings UI.
    pub schema: Schema,
    /// Current settings for the module's namespace.
    pub settings: Value,
    /// Actions the module exposes.
    pub actions: Vec<ActionDescriptor>,
}
