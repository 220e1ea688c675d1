//! GitHub OAuth client
//!
//! Builds the authorization redirect and performs the back-channel calls of
//! the authorization code flow.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;
use url::Url;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::metrics::TOKEN_EXCHANGE_DURATION_SECONDS;

/// Access token issued by GitHub
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

/// GitHub user info
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
}

/// Back-channel operations against the OAuth provider
#[axum::async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken>;

    /// Resolve the account that owns `token`.
    async fn fetch_user(&self, token: &AccessToken) -> Result<GitHubUser>;
}

/// Front-channel half of the flow: the authorization redirect.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client_id: String,
    authorize_url: Url,
    redirect_url: Url,
}

impl OAuthClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client_id: config.auth.github.client_id.clone(),
            authorize_url: config.auth.github.authorize_url.clone(),
            redirect_url: config.redirect_url()?,
        })
    }

    /// Authorization URL for a login attempt identified by `state`.
    ///
    /// Requests online access only and no scope beyond GitHub's default.
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("access_type", "online")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_url.as_str())
            .append_pair("response_type", "code")
            .append_pair("state", state);
        url
    }
}

/// Token endpoint response
///
/// GitHub answers `200 OK` with an `error` field for rejected codes.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

fn parse_token_response(body: &str) -> Result<AccessToken> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AppError::TokenExchange(format!("malformed token response: {e}")))?;

    if let Some(error) = response.error {
        let description = response.error_description.unwrap_or_default();
        return Err(AppError::TokenExchange(format!("{error}: {description}")));
    }

    match response.access_token {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
        _ => Err(AppError::TokenExchange(
            "access_token not present in response".to_string(),
        )),
    }
}

/// GitHub implementation of the back channel
pub struct GitHubProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: Url,
    token_url: Url,
    api_url: Url,
}

impl GitHubProvider {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let github = &config.auth.github;
        let http = reqwest::Client::builder()
            .user_agent(concat!("keygate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(github.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http,
            client_id: github.client_id.clone(),
            client_secret: github.client_secret.clone(),
            redirect_url: config.redirect_url()?,
            token_url: github.token_url.clone(),
            api_url: github.api_url.clone(),
        })
    }

    async fn request_token(&self, code: &str) -> Result<AccessToken> {
        let response = self
            .http
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TokenExchange(format!(
                "token endpoint returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::TokenExchange(e.to_string()))?;
        parse_token_response(&body)
    }

    async fn request_user(&self, token: &AccessToken) -> Result<GitHubUser> {
        let url = format!("{}/user", self.api_url.as_str().trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TokenExchange(format!(
                "user endpoint returned {status}"
            )));
        }

        response
            .json::<GitHubUser>()
            .await
            .map_err(|e| AppError::TokenExchange(format!("malformed user response: {e}")))
    }
}

fn observe<T>(operation: &str, started: Instant, result: &Result<T>) {
    let status = if result.is_ok() { "ok" } else { "error" };
    TOKEN_EXCHANGE_DURATION_SECONDS
        .with_label_values(&[operation, status])
        .observe(started.elapsed().as_secs_f64());
}

#[axum::async_trait]
impl OAuthProvider for GitHubProvider {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        let started = Instant::now();
        let result = self.request_token(code).await;
        observe("exchange_code", started, &result);
        result
    }

    async fn fetch_user(&self, token: &AccessToken) -> Result<GitHubUser> {
        let started = Instant::now();
        let result = self.request_user(token).await;
        observe("fetch_user", started, &result);
        result
    }
}
