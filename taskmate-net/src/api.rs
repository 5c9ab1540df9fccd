use crate::client::ApiClient;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use taskmate_core::{ScopeRef, User};

const SESSION_PATH: &str = "/session";
const SCOPES_PATH: &str = "/dealerships";

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: Vec<T>,
}

/// Sign-in and sign-out against `/session`.
#[derive(Debug, Clone)]
pub struct SessionApi {
    client: ApiClient,
}

impl SessionApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Wrong credentials come back as [`ApiError::Unauthorized`] and leave
    /// any existing session alone.
    pub async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self
            .client
            .post_json(SESSION_PATH, &Credentials { login, password })
            .await?;
        self.client.guard().session_established();
        tracing::info!(user = %response.user.login, "signed in");
        Ok(response)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client.delete(SESSION_PATH).await
    }
}

/// The scopes the signed-in user may act in.
#[derive(Debug, Clone)]
pub struct ScopesApi {
    client: ApiClient,
}

impl ScopesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ScopeRef>, ApiError> {
        let listing: Listing<ScopeRef> = self.client.get_json(SCOPES_PATH).await?;
        Ok(listing.data)
    }
}
