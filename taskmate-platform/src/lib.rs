//! # TaskMate Platform
//!
//! Decides once whether the client runs inside the native shell or a web
//! host, and hands out the matching storage and status-bar adapters.
//!
//! Native adapters need an explicit async bootstrap (`create_storage`,
//! `create_chrome`) before the synchronous accessors work. Web hosts get a
//! zero-configuration fallback on first synchronous access.

pub mod chrome;
pub mod detect;
pub mod error;
pub mod factory;
pub mod storage;
pub mod types;

pub use detect::{PlatformKind, is_native, is_web, resolve};
pub use error::{AdapterKind, PlatformError};
pub use factory::AdapterFactory;
pub use types::{ChromeAdapter, PlatformConfig, StatusBarStyle, StorageAdapter};
