use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use taskmate_app::config::{ConfigError, DEFAULT_LOG_FILTER};
use taskmate_app::util::panic_message;
use taskmate_app::{App, AppConfig, AppSessionHooks, Command};
use taskmate_core::{Role, ScopeRef, ThemePreference, User, WorkspacePhase, bootstrap};
use taskmate_net::SessionHooks;
use taskmate_platform::{AdapterFactory, PlatformConfig, PlatformKind};

// ============================================================================
// Fixtures
// ============================================================================

const TOKEN: &str = "server-token";

#[derive(Default)]
struct ServerState {
    expired: AtomicBool,
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    let role = match body["login"].as_str() {
        Some("olga") => "owner",
        Some("eve") => "employee",
        _ => "manager",
    };
    Json(json!({
        "token": TOKEN,
        "user": {
            "id": 11,
            "login": body["login"],
            "full_name": "Test User",
            "role": role,
            "dealership_id": 3
        }
    }))
    .into_response()
}

async fn dealerships(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false);
    if !bearer || state.expired.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "data": [
            { "id": 3, "name": "North" },
            { "id": 4, "name": "South" }
        ]
    }))
    .into_response()
}

async fn spawn_server() -> (String, Arc<ServerState>) {
    let state = Arc::new(ServerState::default());
    let app = Router::new()
        .route(
            "/session",
            post(login).delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route("/dealerships", get(dealerships))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn web_config(base_url: &str, data_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = base_url.to_string();
    config.platform = PlatformConfig {
        kind: Some(PlatformKind::Web),
        data_dir: Some(data_dir.to_path_buf()),
    };
    config
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("taskmate.toml");
    std::fs::write(&path, body).unwrap();
    path
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
log_filter = "debug"

[api]
base_url = "https://api.taskmate.test/v1"
timeout_secs = 5

[platform]
kind = "native"
data_dir = "/var/lib/taskmate"

[rate_limit]
fallback_window_secs = 90
"#,
    );

    let config = AppConfig::load_from(Some(&path), None).unwrap();
    assert_eq!(config.api.base_url, "https://api.taskmate.test/v1");
    assert_eq!(config.api_config().timeout_ms, 5_000);
    assert_eq!(config.platform.kind, Some(PlatformKind::Native));
    assert_eq!(
        config.platform.data_dir.as_deref(),
        Some(Path::new("/var/lib/taskmate"))
    );
    assert_eq!(config.rate_limit.fallback_window_secs, 90);
    assert_eq!(config.log_filter(), "debug");
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[api]\nbase_url = \"http://127.0.0.1:9000\"\n");

    let config = AppConfig::load_from(Some(&path), None).unwrap();
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.rate_limit.fallback_window_secs, 60);
    assert_eq!(config.platform, PlatformConfig::default());
    assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
}

#[test]
fn test_config_env_override_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[api]\nbase_url = \"http://file.test\"\n");

    let config = AppConfig::load_from(Some(&path), Some(" https://env.test ")).unwrap();
    assert_eq!(config.api.base_url, "https://env.test");

    // Blank override is ignored.
    let config = AppConfig::load_from(Some(&path), Some("  ")).unwrap();
    assert_eq!(config.api.base_url, "http://file.test");
}

#[test]
fn test_config_rejects_relative_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[api]\nbase_url = \"/api/v1\"\n");

    let err = AppConfig::load_from(Some(&path), None).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_config_rejects_zero_windows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[api]\ntimeout_secs = 0\n");
    assert!(matches!(
        AppConfig::load_from(Some(&path), None),
        Err(ConfigError::Invalid(_))
    ));

    let path = write_config(&dir, "[rate_limit]\nfallback_window_secs = 0\n");
    assert!(matches!(
        AppConfig::load_from(Some(&path), None),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_config_missing_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load_from(Some(&dir.path().join("absent.toml")), None).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_config_unparsable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[api\nbase_url = ");
    let err = AppConfig::load_from(Some(&path), None).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("taskmate.toml"));
}

#[test]
fn test_rate_limit_manager_uses_fallback_window() {
    let mut config = AppConfig::default();
    config.rate_limit.fallback_window_secs = 5;
    let manager = config.rate_limit_manager();
    assert!(manager.set_rate_limited(None));
    assert!(manager.remaining_ms() <= 5_000);
    assert!(manager.is_limited());
}

// ============================================================================
// Command Parsing Tests
// ============================================================================

#[test]
fn test_parse_commands() {
    let none: [&str; 0] = [];
    assert_eq!(Command::parse(&none).unwrap(), Command::Status);
    assert_eq!(Command::parse(&["status"]).unwrap(), Command::Status);
    assert_eq!(
        Command::parse(&["login", "ana", "pw"]).unwrap(),
        Command::Login {
            login: "ana".into(),
            password: "pw".into()
        }
    );
    assert_eq!(Command::parse(&["logout"]).unwrap(), Command::Logout);
    assert_eq!(Command::parse(&["scope", "all"]).unwrap(), Command::Scope(None));
    assert_eq!(Command::parse(&["scope", "42"]).unwrap(), Command::Scope(Some(42)));
    assert_eq!(Command::parse(&["refresh"]).unwrap(), Command::Refresh);
    assert_eq!(
        Command::parse(&["theme", "dark"]).unwrap(),
        Command::Theme(ThemePreference::Dark)
    );
}

#[test]
fn test_parse_rejects_bad_input() {
    assert!(Command::parse(&["scope", "north"]).is_err());
    assert!(Command::parse(&["theme", "sepia"]).is_err());
    assert!(Command::parse(&["login", "ana"]).is_err());
    let err = Command::parse(&["frobnicate"]).unwrap_err();
    assert!(err.to_string().contains("usage: taskmate"));
}

// ============================================================================
// Session Hooks Tests
// ============================================================================

#[tokio::test]
async fn test_session_hooks_clear_auth_and_workspace() {
    let factory = Arc::new(AdapterFactory::new(
        PlatformKind::Web,
        PlatformConfig::default(),
    ));
    let stores = bootstrap(factory).await.unwrap();
    let user = User::new(1, "ana", Role::Manager, Some(3));
    stores
        .auth
        .sign_in("abc".to_string(), user.clone())
        .await
        .unwrap();
    stores
        .workspace
        .initialize(&user, &[ScopeRef::new(3, "North")])
        .await
        .unwrap();

    let hooks = AppSessionHooks::new(stores.auth.clone(), stores.workspace.clone());
    assert_eq!(hooks.token().as_deref(), Some("abc"));

    hooks.clear_session();
    assert_eq!(hooks.token(), None);
    assert!(!stores.auth.is_authenticated());
    assert_eq!(stores.workspace.phase(), WorkspacePhase::Uninitialized);
    assert_eq!(stores.workspace.selected_scope_id(), None);
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_login_initializes_workspace() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&web_config(&base, dir.path())).await.unwrap();
    assert_eq!(app.current_path(), "/login");

    let out = app
        .run(Command::Login {
            login: "ana".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert!(out.contains("signed in as ana (manager)"));
    assert!(app.stores().auth.is_authenticated());
    assert_eq!(app.stores().workspace.selected_scope_id(), Some(3));
    assert_eq!(app.stores().workspace.phase(), WorkspacePhase::Valid);
    assert_eq!(app.current_path(), "/");

    let status = app.run(Command::Status).await.unwrap();
    assert!(status.contains("platform:  web"));
    assert!(status.contains("session:   ana (manager)"));
    assert!(status.contains("workspace: #3 [valid]"));
}

#[tokio::test]
async fn test_wrong_password_records_error() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&web_config(&base, dir.path())).await.unwrap();

    let err = app
        .run(Command::Login {
            login: "ana".into(),
            password: "nope".into(),
        })
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("login rejected"));
    assert!(!app.stores().auth.is_authenticated());
    assert!(app.stores().auth.last_error().is_some());
}

#[tokio::test]
async fn test_scope_switching_rules() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&web_config(&base, dir.path())).await.unwrap();
    app.run(Command::Login {
        login: "ana".into(),
        password: "secret".into(),
    })
    .await
    .unwrap();

    assert_eq!(app.run(Command::Scope(Some(4))).await.unwrap(), "workspace #4");
    assert!(app.run(Command::Scope(Some(99))).await.is_err());
    assert!(app.run(Command::Scope(None)).await.is_err());
    assert_eq!(app.stores().workspace.selected_scope_id(), Some(4));
}

#[tokio::test]
async fn test_employee_is_held_to_home_scope() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&web_config(&base, dir.path())).await.unwrap();
    app.run(Command::Login {
        login: "eve".into(),
        password: "secret".into(),
    })
    .await
    .unwrap();
    assert_eq!(app.stores().workspace.selected_scope_id(), Some(3));

    // Scope 4 is listed by the server but is not eve's home.
    let err = app.run(Command::Scope(Some(4))).await.unwrap_err();
    assert!(err.to_string().contains("home scope"));
    assert!(app.run(Command::Scope(None)).await.is_err());
    assert_eq!(app.stores().workspace.selected_scope_id(), Some(3));

    assert_eq!(app.run(Command::Scope(Some(3))).await.unwrap(), "workspace #3");
}

#[tokio::test]
async fn test_owner_can_select_all_scopes() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&web_config(&base, dir.path())).await.unwrap();
    app.run(Command::Login {
        login: "olga".into(),
        password: "secret".into(),
    })
    .await
    .unwrap();

    assert_eq!(app.run(Command::Scope(None)).await.unwrap(), "workspace all scopes");
    let out = app.run(Command::Refresh).await.unwrap();
    assert_eq!(out, "2 scope(s) available, workspace all scopes");
}

#[tokio::test]
async fn test_state_survives_restart() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = web_config(&base, dir.path());

    {
        let app = App::start(&config).await.unwrap();
        app.run(Command::Login {
            login: "ana".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
        app.run(Command::Scope(Some(4))).await.unwrap();
        app.run(Command::Theme(ThemePreference::Dark)).await.unwrap();
    }

    let app = App::start(&config).await.unwrap();
    assert!(app.stores().auth.is_authenticated());
    assert_eq!(app.stores().workspace.selected_scope_id(), Some(4));
    assert_eq!(app.current_path(), "/");
    let status = app.run(Command::Status).await.unwrap();
    assert!(status.contains("theme:     dark"));
}

#[tokio::test]
async fn test_expired_session_clears_stores() {
    let (base, server) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = web_config(&base, dir.path());
    let app = App::start(&config).await.unwrap();
    app.run(Command::Login {
        login: "ana".into(),
        password: "secret".into(),
    })
    .await
    .unwrap();

    server.expired.store(true, Ordering::SeqCst);
    let err = app.run(Command::Refresh).await.unwrap_err();
    assert!(format!("{err:#}").contains("session expired"));

    assert!(!app.stores().auth.is_authenticated());
    assert_eq!(app.stores().workspace.phase(), WorkspacePhase::Uninitialized);
    assert_eq!(app.current_path(), "/login");

    // Signed out now, so refresh needs a login first.
    assert!(app.run(Command::Refresh).await.is_err());
}

#[tokio::test]
async fn test_expired_session_stays_cleared_after_restart() {
    let (base, server) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = web_config(&base, dir.path());
    config.platform.kind = Some(PlatformKind::Native);

    {
        let app = App::start(&config).await.unwrap();
        app.run(Command::Login {
            login: "ana".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
        server.expired.store(true, Ordering::SeqCst);
        assert!(app.run(Command::Refresh).await.is_err());
    }

    let app = App::start(&config).await.unwrap();
    assert!(!app.stores().auth.is_authenticated());
    assert!(app.stores().auth.token().is_none());
    assert_eq!(app.stores().workspace.phase(), WorkspacePhase::Uninitialized);
    assert_eq!(app.stores().workspace.selected_scope_id(), None);
    assert_eq!(app.current_path(), "/login");
}

#[tokio::test]
async fn test_logout_resets_everything() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let app = App::start(&web_config(&base, dir.path())).await.unwrap();
    app.run(Command::Login {
        login: "ana".into(),
        password: "secret".into(),
    })
    .await
    .unwrap();

    assert_eq!(app.run(Command::Logout).await.unwrap(), "signed out");
    assert!(!app.stores().auth.is_authenticated());
    assert_eq!(app.stores().workspace.selected_scope_id(), None);
    assert_eq!(app.current_path(), "/login");
}

#[tokio::test]
async fn test_theme_command_drives_native_chrome() {
    let (base, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = web_config(&base, dir.path());
    config.platform.kind = Some(PlatformKind::Native);

    let app = App::start(&config).await.unwrap();
    let mut commands = app.factory().chrome_commands();

    let out = app.run(Command::Theme(ThemePreference::Dark)).await.unwrap();
    assert_eq!(out, "theme dark (dark)");
    assert!(commands.try_recv().is_ok());
}

#[tokio::test]
async fn test_boot_failure_is_reported() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let mut config = AppConfig::default();
    config.platform = PlatformConfig {
        kind: Some(PlatformKind::Native),
        data_dir: Some(blocker.path().to_path_buf()),
    };

    let err = App::start(&config).await.err().unwrap();
    assert!(format!("{err:#}").contains("failed to restore client state"));
}

// ============================================================================
// Panic Hook Tests
// ============================================================================

#[test]
fn test_panic_message_reads_string_payloads() {
    let literal: Box<dyn Any + Send> = Box::new("static text");
    assert_eq!(panic_message(literal.as_ref()), "static text");

    let formatted: Box<dyn Any + Send> = Box::new(format!("scope {}", 7));
    assert_eq!(panic_message(formatted.as_ref()), "scope 7");

    let other: Box<dyn Any + Send> = Box::new(42_u8);
    assert_eq!(panic_message(other.as_ref()), "non-string payload");
}
