use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// A signed-in user as returned by the identity service.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn expires_at(expires_in: &str) -> DateTime<Utc> {
    let seconds = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(seconds)
}

/// Pull the `error.message` code (e.g. `INVALID_PASSWORD`) out of a failure body.
fn error_code(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Email/password sign-in against the Identity Toolkit REST API.
pub async fn sign_in_with_password(
    client: &Client,
    auth_base_url: &str,
    api_key: &str,
    email: &str,
    password: &str,
) -> Result<AuthSession> {
    let url = format!(
        "{}/accounts:signInWithPassword?key={}",
        auth_base_url.trim_end_matches('/'),
        urlencoding::encode(api_key)
    );
    let payload = serde_json::json!({
        "email": email,
        "password": password,
        "returnSecureToken": true,
    });

    let response = client.post(&url).json(&payload).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("Sign-in failed: {} - {}", status, error_code(&body)));
    }

    let signed_in: SignInResponse = response.json().await?;
    info!("Signed in as {}", signed_in.local_id);
    Ok(AuthSession {
        user_id: signed_in.local_id,
        email: signed_in.email,
        id_token: signed_in.id_token,
        refresh_token: signed_in.refresh_token,
        expires_at: expires_at(&signed_in.expires_in),
    })
}

/// Exchange a refresh token for a fresh id token.
pub async fn refresh_id_token(client: &Client, api_key: &str, refresh_token: &str) -> Result<AuthSession> {
    let url = format!("{}?key={}", SECURE_TOKEN_URL, urlencoding::encode(api_key));
    let form = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];

    let response = client.post(&url).form(&form).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("Token refresh failed: {} - {}", status, error_code(&body)));
    }

    let refreshed: RefreshResponse = response.json().await?;
    Ok(AuthSession {
        user_id: refreshed.user_id,
        email: None,
        id_token: refreshed.id_token,
        refresh_token: refreshed.refresh_token,
        expires_at: expires_at(&refreshed.expires_in),
    })
}
