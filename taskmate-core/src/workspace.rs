// taskmate-core/src/workspace.rs
//
// Workspace selection state machine.
//
// Derives the active scope from the user's role, the persisted selection and
// the live permitted set:
//   employee          -> always the home scope
//   owner             -> a permitted scope, or None for "all scopes"
//   manager/observer  -> a permitted scope; invalid picks fall back to the
//                        first permitted one

use crate::cell::StoreCell;
use crate::persist::{PersistBridge, PersistError, Persisted};
use crate::user::{Role, ScopeId, ScopeRef, User, is_permitted};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

pub const WORKSPACE_STORE: &str = "workspace-storage";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace must be initialized before it can be validated")]
    NotInitialized,

    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspacePhase {
    Uninitialized,
    /// Selection was kept or derived from the role defaults.
    Valid,
    /// A previous selection was no longer permitted and got replaced.
    Fallback,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSelection {
    pub selected_scope_id: Option<ScopeId>,
    pub has_initialized: bool,
    /// Not persisted.
    pub fell_back: bool,
}

/// Persisted projection of the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub selected_scope_id: Option<ScopeId>,
    pub has_initialized: bool,
}

impl Persisted for WorkspaceSelection {
    type Durable = WorkspaceSnapshot;

    fn project(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            selected_scope_id: self.selected_scope_id,
            has_initialized: self.has_initialized,
        }
    }

    fn restore(durable: WorkspaceSnapshot) -> Self {
        Self {
            selected_scope_id: durable.selected_scope_id,
            has_initialized: durable.has_initialized,
            fell_back: false,
        }
    }
}

/// Role-driven reconciliation. Returns the selection and whether a prior
/// selection had to be replaced.
fn reconcile(
    user: &User,
    scopes: &[ScopeRef],
    current: Option<ScopeId>,
) -> (Option<ScopeId>, bool) {
    match user.role {
        Role::Employee => (user.home_scope_id, false),
        Role::Owner => match current {
            None => (None, false),
            Some(id) if is_permitted(scopes, id) => (Some(id), false),
            Some(_) => (None, true),
        },
        Role::Manager | Role::Observer => match current {
            Some(id) if is_permitted(scopes, id) => (Some(id), false),
            _ => (scopes.first().map(|s| s.id), current.is_some()),
        },
    }
}

impl WorkspaceSelection {
    pub fn phase(&self) -> WorkspacePhase {
        if !self.has_initialized {
            WorkspacePhase::Uninitialized
        } else if self.fell_back {
            WorkspacePhase::Fallback
        } else {
            WorkspacePhase::Valid
        }
    }

    /// Whether the current selection may be kept as-is for this user.
    pub fn is_valid_for(&self, user: &User, scopes: &[ScopeRef]) -> bool {
        match (user.role, self.selected_scope_id) {
            (Role::Employee, selected) => selected == user.home_scope_id,
            (Role::Owner, None) => true,
            (_, Some(id)) => is_permitted(scopes, id),
            (_, None) => false,
        }
    }

    /// Once-per-login reconciliation. Returns whether anything changed.
    ///
    /// After the first call this only corrects an invalid selection; a still
    /// valid one is never overwritten.
    pub fn initialize(&mut self, user: &User, scopes: &[ScopeRef]) -> bool {
        if self.has_initialized && self.is_valid_for(user, scopes) {
            return false;
        }

        let (next, replaced) = reconcile(user, scopes, self.selected_scope_id);
        let changed = !self.has_initialized || next != self.selected_scope_id;
        if next != self.selected_scope_id {
            self.fell_back = replaced;
        }
        self.selected_scope_id = next;
        self.has_initialized = true;
        changed
    }

    /// Reconciliation after the permitted set changed mid-session.
    ///
    /// Never marks the workspace initialized. Rejected before `initialize`.
    pub fn validate_and_update(
        &mut self,
        user: &User,
        scopes: &[ScopeRef],
    ) -> Result<bool, WorkspaceError> {
        if !self.has_initialized {
            return Err(WorkspaceError::NotInitialized);
        }

        let (next, replaced) = reconcile(user, scopes, self.selected_scope_id);
        if next == self.selected_scope_id {
            return Ok(false);
        }
        self.selected_scope_id = next;
        self.fell_back = replaced;
        Ok(true)
    }

    /// Explicit user choice.
    pub fn set_scope(&mut self, id: Option<ScopeId>) -> bool {
        if self.selected_scope_id == id && !self.fell_back {
            return false;
        }
        self.selected_scope_id = id;
        self.fell_back = false;
        true
    }

    pub fn reset(&mut self) -> bool {
        if *self == Self::default() {
            return false;
        }
        *self = Self::default();
        true
    }
}

/// The persisted workspace store shared by the session flow and screens.
#[derive(Debug)]
pub struct WorkspaceStore {
    cell: StoreCell<WorkspaceSelection>,
}

impl WorkspaceStore {
    pub fn new(bridge: PersistBridge) -> Self {
        Self {
            cell: StoreCell::new(bridge, WORKSPACE_STORE, WorkspaceSelection::default()),
        }
    }

    pub async fn rehydrate(&self) -> Result<bool, PersistError> {
        self.cell.rehydrate().await
    }

    pub fn selection(&self) -> WorkspaceSelection {
        self.cell.snapshot()
    }

    pub fn selected_scope_id(&self) -> Option<ScopeId> {
        self.cell.read(|s| s.selected_scope_id)
    }

    pub fn phase(&self) -> WorkspacePhase {
        self.cell.read(WorkspaceSelection::phase)
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkspaceSelection> {
        self.cell.subscribe()
    }

    pub async fn initialize(
        &self,
        user: &User,
        scopes: &[ScopeRef],
    ) -> Result<bool, WorkspaceError> {
        let changed = self.cell.update(|s| s.initialize(user, scopes)).await?;
        if changed {
            tracing::info!(
                user = user.id,
                role = ?user.role,
                scope = ?self.selected_scope_id(),
                "workspace initialized"
            );
        }
        Ok(changed)
    }

    pub async fn validate_and_update(
        &self,
        user: &User,
        scopes: &[ScopeRef],
    ) -> Result<bool, WorkspaceError> {
        let changed = self
            .cell
            .try_update(|s| s.validate_and_update(user, scopes))
            .await?;
        if changed {
            tracing::info!(scope = ?self.selected_scope_id(), "workspace selection corrected");
        }
        Ok(changed)
    }

    pub async fn set_scope(&self, id: Option<ScopeId>) -> Result<bool, WorkspaceError> {
        Ok(self.cell.update(|s| s.set_scope(id)).await?)
    }

    pub async fn reset(&self) -> Result<bool, WorkspaceError> {
        Ok(self.cell.update(WorkspaceSelection::reset).await?)
    }

    pub async fn flush(&self) -> Result<(), PersistError> {
        self.cell.flush().await
    }

    /// Logout path for sync callers.
    pub fn reset_detached(&self) -> bool {
        self.cell.update_detached(WorkspaceSelection::reset)
    }
}
