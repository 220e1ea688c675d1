//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum_extra::extract::cookie::{Cookie, CookieJar};
use keygate::auth::{AccessToken, GitHubUser, OAuthProvider, Session};
use keygate::error::AppError;
use keygate::{AppState, config};
use tokio::net::TcpListener;
use url::Url;

/// GitHub back channel replacement with call counting
pub struct StubProvider {
    token: Option<String>,
    login: String,
    exchange_calls: AtomicUsize,
}

impl StubProvider {
    pub fn returning(token: &str, login: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            login: login.to_string(),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            token: None,
            login: String::new(),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

#[axum::async_trait]
impl OAuthProvider for StubProvider {
    async fn exchange_code(&self, _code: &str) -> Result<AccessToken, AppError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.token
            .clone()
            .map(AccessToken::new)
            .ok_or_else(|| AppError::TokenExchange("bad_verification_code".to_string()))
    }

    async fn fetch_user(&self, _token: &AccessToken) -> Result<GitHubUser, AppError> {
        Ok(GitHubUser {
            login: self.login.clone(),
            id: 583231,
        })
    }
}

pub fn test_config() -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "localhost:8080".to_string(),
            protocol: "http".to_string(),
        },
        auth: config::AuthConfig {
            session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
            cookie_name: "github-auth-session".to_string(),
            session_max_age: None,
            github: config::GitHubOAuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                redirect_url: None,
                authorize_url: Url::parse("https://github.com/login/oauth/authorize").unwrap(),
                token_url: Url::parse("https://github.com/login/oauth/access_token").unwrap(),
                api_url: Url::parse("https://api.github.com").unwrap(),
                timeout_seconds: 10,
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub provider: Arc<StubProvider>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a test server whose GitHub exchange yields `abc123` for `alice`
    pub async fn new() -> Self {
        Self::with_provider(StubProvider::returning("abc123", "alice")).await
    }

    pub async fn with_provider(provider: StubProvider) -> Self {
        let provider = Arc::new(provider);
        let state = AppState::with_provider(test_config(), provider.clone()).unwrap();

        // Redirects are asserted, not followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = keygate::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            provider,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// `Cookie` header value carrying `session`
    pub fn session_cookie(&self, session: &Session) -> String {
        let value = self.state.sessions.encode(session).unwrap();
        format!("{}={}", self.state.sessions.cookie_name(), value)
    }

    /// `Cookie` header value for a signed-in user
    pub fn authenticated_cookie(&self, user: &str) -> String {
        self.session_cookie(&Session {
            token: Some("gho_test_token".to_string()),
            user: Some(user.to_string()),
            ..Session::default()
        })
    }

    /// Session cookie set by a response, as a `Cookie` header value
    pub fn cookie_from(&self, response: &reqwest::Response) -> Option<String> {
        self.set_cookie(response)
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
    }

    /// Session decoded from the cookie set by a response
    pub fn session_from(&self, response: &reqwest::Response) -> Option<Session> {
        let cookie = self.set_cookie(response)?;
        let jar = CookieJar::new().add(cookie);
        Some(self.state.sessions.load(&jar))
    }

    pub fn set_cookie(&self, response: &reqwest::Response) -> Option<Cookie<'static>> {
        response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .find(|cookie| cookie.name() == self.state.sessions.cookie_name())
    }
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}
