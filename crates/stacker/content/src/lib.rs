//! Data-driven stacker content and loaders.
//!
//! This crate ships the default content and loads overrides from disk:
//! - Per-type stack settings (RON)
//! - Engine configuration (TOML)
//! - Message templates (TOML)
//!
//! The defaults are embedded at compile time, so a host can run without any
//! data directory.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentBundle, ContentFactory, MessagesLoader, SettingsLoader};
