use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ArbiterError, Result};
use crate::models::User;

#[derive(Debug, Serialize, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Exchanges email/password credentials for a bearer token at the backend's
/// login endpoint. The returned token is what [`ArbiterConfig`](crate::ArbiterConfig)
/// carries on every subsequent request.
pub async fn login(base_url: &str, credentials: &LoginCredentials) -> Result<AuthResponse> {
    let url = format!("{}/login", base_url.trim_end_matches('/'));
    let client = Client::new();
    let response = client.post(url).json(credentials).send().await?;

    let status = response.status();
    if status.is_success() {
        response
            .json::<AuthResponse>()
            .await
            .map_err(ArbiterError::from)
    } else if status.as_u16() == 401 || status.as_u16() == 422 {
        Err(ArbiterError::Authentication(
            "invalid credentials".to_string(),
        ))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ArbiterError::http(status, None, body))
    }
}

/// Fetches the authenticated user's profile with an already-issued token.
/// Useful for validating a stored token on startup.
pub async fn profile(base_url: &str, token: &str) -> Result<User> {
    let url = format!("{}/profile", base_url.trim_end_matches('/'));
    let client = Client::new();
    let response = client.get(url).bearer_auth(token).send().await?;

    let status = response.status();
    if status.is_success() {
        response.json::<User>().await.map_err(ArbiterError::from)
    } else if status.as_u16() == 401 {
        Err(ArbiterError::Authentication(
            "token rejected".to_string(),
        ))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ArbiterError::http(status, None, body))
    }
}
