use anyhow::{Result, anyhow, bail};
use taskmate_core::{ScopeId, ThemePreference};

pub const USAGE: &str = "\
usage: taskmate [command]

commands:
  status                      show session, workspace and theme (default)
  login <login> <password>    sign in and pick a workspace
  logout                      sign out
  scope <id|all>              switch workspace
  refresh                     re-check the workspace against the server
  theme <light|dark|system>   change the theme";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Login { login: String, password: String },
    Logout,
    /// `None` selects all scopes.
    Scope(Option<ScopeId>),
    Refresh,
    Theme(ThemePreference),
}

impl Command {
    /// Parse the arguments after the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let parts: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        match parts.as_slice() {
            [] | ["status"] => Ok(Command::Status),
            ["login", login, password] => Ok(Command::Login {
                login: login.to_string(),
                password: password.to_string(),
            }),
            ["logout"] => Ok(Command::Logout),
            ["scope", "all"] => Ok(Command::Scope(None)),
            ["scope", id] => id
                .parse::<ScopeId>()
                .map(|id| Command::Scope(Some(id)))
                .map_err(|_| anyhow!("invalid scope id '{id}'")),
            ["refresh"] => Ok(Command::Refresh),
            ["theme", name] => name
                .parse::<ThemePreference>()
                .map(Command::Theme)
                .map_err(|e| anyhow!(e)),
            _ => bail!("unrecognized command: {}\n\n{USAGE}", parts.join(" ")),
        }
    }
}
