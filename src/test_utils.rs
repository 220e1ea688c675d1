//! Shared helpers for unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::header;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::AppState;
use crate::auth::{AccessToken, GitHubUser, OAuthProvider, Session};
use crate::config::tests::valid_config;
use crate::error::AppError;

/// Back channel that never leaves the process
pub(crate) struct StubProvider {
    token: Option<String>,
    user: Option<String>,
    exchange_calls: AtomicUsize,
}

impl StubProvider {
    pub(crate) fn returning(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            user: Some("octocat".to_string()),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            token: None,
            user: None,
            exchange_calls: AtomicUsize::new(0),
        }
    }

    /// Issues `token` but cannot resolve its owner
    pub(crate) fn without_user(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            user: None,
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn exchange_calls(&self) -> usize {
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
        self.user
            .clone()
            .map(|login| GitHubUser { login, id: 1 })
            .ok_or_else(|| AppError::TokenExchange("user endpoint returned 401".to_string()))
    }
}

pub(crate) fn test_state(provider: Arc<StubProvider>) -> AppState {
    AppState::with_provider(valid_config(), provider).expect("test state")
}

/// `Cookie` request header value carrying `session`
pub(crate) fn session_cookie(state: &AppState, session: &Session) -> String {
    let value = state.sessions.encode(session).expect("encode session");
    format!("{}={}", state.sessions.cookie_name(), value)
}

/// Session written by a response, if it set one
pub(crate) fn session_from_response(state: &AppState, response: &Response) -> Option<Session> {
    let jar = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .filter(|cookie| cookie.name() == state.sessions.cookie_name())
        .fold(CookieJar::new(), |jar, cookie| jar.add(cookie));

    jar.get(state.sessions.cookie_name())?;
    Some(state.sessions.load(&jar))
}
