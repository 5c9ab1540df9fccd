use serde::{Deserialize, Serialize};

/// Identifier of a scope (dealership) as issued by the server.
pub type ScopeId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Observer,
    Manager,
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    /// The user's own scope. Fixed for employees.
    #[serde(rename = "dealership_id", default)]
    pub home_scope_id: Option<ScopeId>,
}

impl User {
    pub fn new(id: i64, login: &str, role: Role, home_scope_id: Option<ScopeId>) -> Self {
        Self {
            id,
            login: login.to_string(),
            full_name: None,
            role,
            home_scope_id,
        }
    }
}

/// One entry of the permitted scope set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRef {
    pub id: ScopeId,
    pub name: String,
}

impl ScopeRef {
    pub fn new(id: ScopeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

pub(crate) fn is_permitted(scopes: &[ScopeRef], id: ScopeId) -> bool {
    scopes.iter().any(|s| s.id == id)
}
