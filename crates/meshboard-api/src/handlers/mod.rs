//! HTTP request handlers, organized by domain.

pub mod health;
pub mod modules;
pub mod settings;
pub mod webhook;
