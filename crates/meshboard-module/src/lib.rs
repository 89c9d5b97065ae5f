//! # meshboard-module
//!
//! The module contract and registry.
//!
//! Every feature module (notifications, branding, webhooks, ...) exposes
//! the same capability set — default settings, a UI schema, validation,
//! named actions, and event subscriptions — through the [`Module`]
//! trait. The [`registry::ModuleRegistry`] loads modules against the
//! settings store and fans canonical events out to every subscribed,
//! enabled module with per-module failure isolation.

pub mod contract;
pub mod registry;
pub mod schema;
pub mod validate;

pub use contract::{ActionDescriptor, DeliveryResult, HandleOutcome, Module, ModuleInfo};
pub use registry::ModuleRegistry;
pub use schema::{Field, FieldType, Schema};
