pub mod auth;
pub mod boot;
pub mod cell;
pub mod persist;
pub mod prefs;
pub mod theme;
pub mod user;
pub mod workspace;

pub use auth::{AuthState, AuthStore};
pub use boot::{BootError, Stores, bootstrap};
pub use persist::{NamedStore, PersistBridge, PersistError, Persisted};
pub use prefs::{UiPrefs, UiPrefsStore};
pub use theme::ThemePreference;
pub use user::{Role, ScopeId, ScopeRef, User};
pub use workspace::{WorkspaceError, WorkspacePhase, WorkspaceSelection, WorkspaceStore};
