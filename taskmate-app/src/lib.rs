//! The TaskMate client binary's library half.
//!
//! Loads [`AppConfig`], boots the platform adapters and stores, wires the
//! session hooks into the HTTP transport and runs [`Command`]s.

pub mod app;
pub mod command;
pub mod config;
pub mod hooks;
pub mod util;

pub use app::App;
pub use command::{Command, USAGE};
pub use config::{AppConfig, ConfigError};
pub use hooks::AppSessionHooks;
