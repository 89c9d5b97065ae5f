//! End-to-end integration tests against the full router.

mod helpers;

mod modules_test;
mod settings_test;
mod webhook_test;
