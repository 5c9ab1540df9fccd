// taskmate-app/src/app.rs
//
// Wires the platform, the stores and the transport together, and runs the
// CLI commands on top of them.

use crate::command::Command;
use crate::config::AppConfig;
use crate::hooks::AppSessionHooks;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use taskmate_core::theme::sync_chrome;
use taskmate_core::{
    Role, ScopeId, ScopeRef, Stores, ThemePreference, User, WorkspaceError, WorkspacePhase,
    bootstrap,
};
use taskmate_net::{
    ApiClient, ApiError, LOGIN_PATH, Navigator, RouteTracker, ScopesApi, SessionApi, SessionGuard,
};
use taskmate_platform::AdapterFactory;
use tracing::{info, warn};

const HOME_PATH: &str = "/";

pub struct App {
    factory: Arc<AdapterFactory>,
    stores: Stores,
    routes: Arc<RouteTracker>,
    client: ApiClient,
}

impl App {
    // ════════════════════════════════════════════════════════════════
    // Boot
    // ════════════════════════════════════════════════════════════════

    /// Build the adapters, restore every store and connect the transport.
    pub async fn start(config: &AppConfig) -> Result<Self> {
        let factory = Arc::new(AdapterFactory::for_current_platform(
            config.platform.clone(),
        ));
        info!(platform = %factory.platform(), "booting");

        let stores = bootstrap(factory.clone())
            .await
            .context("failed to restore client state")?;

        let start_path = if stores.auth.is_authenticated() {
            HOME_PATH
        } else {
            LOGIN_PATH
        };
        let routes = Arc::new(RouteTracker::new(start_path));
        let hooks = Arc::new(AppSessionHooks::new(
            stores.auth.clone(),
            stores.workspace.clone(),
        ));
        let guard = Arc::new(SessionGuard::new(
            hooks,
            routes.clone(),
            config.rate_limit_manager(),
        ));
        let client = ApiClient::new(&config.api_config(), guard)?;

        let app = Self {
            factory,
            stores,
            routes,
            client,
        };
        app.apply_saved_theme().await?;
        Ok(app)
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn factory(&self) -> &Arc<AdapterFactory> {
        &self.factory
    }

    pub fn current_path(&self) -> String {
        self.routes.current_path()
    }

    fn session_api(&self) -> SessionApi {
        SessionApi::new(self.client.clone())
    }

    fn scopes_api(&self) -> ScopesApi {
        ScopesApi::new(self.client.clone())
    }

    // ════════════════════════════════════════════════════════════════
    // Commands
    // ════════════════════════════════════════════════════════════════

    /// Run one command and return what should be printed.
    ///
    /// When the server reports the session lost, the cleared stores are
    /// written out before returning, since the process exits right after.
    pub async fn run(&self, command: Command) -> Result<String> {
        let result = match command {
            Command::Status => self.status().await,
            Command::Login { login, password } => self.login(&login, &password).await,
            Command::Logout => self.logout().await,
            Command::Scope(target) => self.switch_scope(target).await,
            Command::Refresh => self.refresh().await,
            Command::Theme(pref) => self.change_theme(pref).await,
        };

        if let Err(err) = &result {
            if matches!(err.downcast_ref::<ApiError>(), Some(ApiError::AuthExpired(_))) {
                self.stores
                    .persist_session()
                    .await
                    .context("failed to persist the cleared session")?;
            }
        }
        result
    }

    async fn status(&self) -> Result<String> {
        let storage = self.factory.storage()?;
        let theme = ThemePreference::load(storage.as_ref()).await?;
        let workspace = self.stores.workspace.selection();
        let rate_limit = self.client.guard().rate_limit();

        let mut lines = vec![format!("platform:  {}", self.factory.platform())];
        lines.push(match self.stores.auth.user() {
            Some(user) => format!("session:   {} ({})", user.login, role_name(user.role)),
            None => "session:   signed out".to_string(),
        });
        lines.push(format!(
            "workspace: {} [{}]",
            scope_label(workspace.selected_scope_id),
            phase_name(workspace.phase())
        ));
        lines.push(format!("theme:     {}", theme.as_str()));
        let collapsed = self.stores.ui.prefs().sidebar_collapsed;
        lines.push(format!(
            "sidebar:   {}",
            if collapsed { "collapsed" } else { "expanded" }
        ));
        if rate_limit.is_limited() {
            let secs = rate_limit.remaining_ms().div_ceil(1000);
            lines.push(format!("backoff:   {secs}s remaining"));
        }
        Ok(lines.join("\n"))
    }

    async fn login(&self, login: &str, password: &str) -> Result<String> {
        let response = match self.session_api().login(login, password).await {
            Ok(response) => response,
            Err(err @ ApiError::Unauthorized(_)) => {
                self.stores.auth.record_error("invalid login or password");
                return Err(err).context("sign-in failed");
            }
            Err(err) => return Err(err).context("sign-in failed"),
        };

        let user = response.user;
        self.stores
            .auth
            .sign_in(response.token, user.clone())
            .await?;

        let scopes = self.scopes_api().list().await?;
        self.stores.workspace.initialize(&user, &scopes).await?;
        self.routes.navigate_to(HOME_PATH);

        Ok(format!(
            "signed in as {} ({}), workspace {}",
            user.login,
            role_name(user.role),
            scope_label(self.stores.workspace.selected_scope_id())
        ))
    }

    async fn logout(&self) -> Result<String> {
        if self.stores.auth.token().is_some() {
            if let Err(err) = self.session_api().logout().await {
                warn!(%err, "server-side sign-out failed");
            }
        }
        self.stores.auth.sign_out().await?;
        self.stores.workspace.reset().await?;
        if !self.routes.current_path().contains(LOGIN_PATH) {
            self.routes.navigate_to(LOGIN_PATH);
        }
        Ok("signed out".to_string())
    }

    async fn switch_scope(&self, target: Option<ScopeId>) -> Result<String> {
        let user = self.require_user()?;
        let scopes = self.scopes_api().list().await?;

        match target {
            None if user.role != Role::Owner => {
                bail!("only owners can work across all scopes")
            }
            Some(id) if user.role == Role::Employee && user.home_scope_id != Some(id) => {
                bail!("employees stay in their home scope")
            }
            Some(id) if !scopes.iter().any(|s| s.id == id) => {
                bail!("scope {id} is not available to {}", user.login)
            }
            _ => {}
        }

        self.stores.workspace.set_scope(target).await?;
        self.reconcile(&user, &scopes).await?;

        Ok(format!(
            "workspace {}",
            scope_label(self.stores.workspace.selected_scope_id())
        ))
    }

    async fn refresh(&self) -> Result<String> {
        let user = self.require_user()?;
        let scopes = self.scopes_api().list().await?;
        let changed = self.reconcile(&user, &scopes).await?;

        Ok(format!(
            "{} scope(s) available, workspace {}{}",
            scopes.len(),
            scope_label(self.stores.workspace.selected_scope_id()),
            if changed { " (updated)" } else { "" }
        ))
    }

    async fn change_theme(&self, pref: ThemePreference) -> Result<String> {
        let storage = self.factory.storage()?;
        pref.save(storage.as_ref()).await?;
        let dark = self.apply_theme(pref).await?;
        Ok(format!(
            "theme {} ({})",
            pref.as_str(),
            if dark { "dark" } else { "light" }
        ))
    }

    // ════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════

    fn require_user(&self) -> Result<User> {
        self.stores
            .auth
            .user()
            .context("not signed in; run `taskmate login <login> <password>`")
    }

    /// Validate the selection, initializing the workspace on first use.
    async fn reconcile(&self, user: &User, scopes: &[ScopeRef]) -> Result<bool> {
        match self.stores.workspace.validate_and_update(user, scopes).await {
            Err(WorkspaceError::NotInitialized) => {
                Ok(self.stores.workspace.initialize(user, scopes).await?)
            }
            other => Ok(other?),
        }
    }

    async fn apply_saved_theme(&self) -> Result<()> {
        let storage = self.factory.storage()?;
        let pref = ThemePreference::load(storage.as_ref()).await?;
        self.apply_theme(pref).await?;
        Ok(())
    }

    async fn apply_theme(&self, pref: ThemePreference) -> Result<bool> {
        // The CLI cannot read the OS theme; "system" resolves to light.
        let dark = pref.resolve_dark(false);
        let chrome = self.factory.chrome()?;
        sync_chrome(chrome.as_ref(), dark).await?;
        Ok(dark)
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Employee => "employee",
        Role::Observer => "observer",
        Role::Manager => "manager",
        Role::Owner => "owner",
    }
}

fn phase_name(phase: WorkspacePhase) -> &'static str {
    match phase {
        WorkspacePhase::Uninitialized => "uninitialized",
        WorkspacePhase::Valid => "valid",
        WorkspacePhase::Fallback => "fallback",
    }
}

fn scope_label(id: Option<ScopeId>) -> String {
    match id {
        Some(id) => format!("#{id}"),
        None => "all scopes".to_string(),
    }
}
