//! # meshboard-core
//!
//! Core crate for Meshboard. Contains the unified error system,
//! application configuration schemas, and the canonical event types
//! shared by the settings store, module registry, and dispatchers.
//!
//! This crate has **no** internal dependencies on other Meshboard crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
