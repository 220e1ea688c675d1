//! Authentication gate
//!
//! Wraps every route. Requests are classified by path into the login
//! redirect, the OAuth callback, or a protected resource; protected
//! resources are only reached with an authenticated session.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::identity::AuthenticatedIdentity;
use super::oauth::{AccessToken, GitHubUser};
use super::state_token::generate_state;
use crate::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{CALLBACKS_TOTAL, GATE_DECISIONS_TOTAL, LOGINS_STARTED_TOTAL};

/// Starts the OAuth flow
pub const LOGIN_PATH: &str = "/auth/github/login";
/// Completes the OAuth flow
pub const CALLBACK_PATH: &str = "/auth/github/callback";

/// Gate dispatch for a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRoute {
    Login,
    Callback,
    Protected,
}

impl AuthRoute {
    pub fn classify(path: &str) -> Self {
        match path {
            LOGIN_PATH => AuthRoute::Login,
            CALLBACK_PATH => AuthRoute::Callback,
            _ => AuthRoute::Protected,
        }
    }
}

/// Query parameters from GitHub callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// CSRF state token
    #[serde(default)]
    pub state: Option<String>,
    /// Authorization code
    #[serde(default)]
    pub code: Option<String>,
}

/// Middleware guarding every route
///
/// # Usage
/// ```ignore
/// let app = Router::new()
///     .route("/", get(home))
///     .fallback(not_found)
///     .layer(middleware::from_fn_with_state(state.clone(), auth_gate));
/// ```
pub async fn auth_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match AuthRoute::classify(request.uri().path()) {
        AuthRoute::Login => begin_login(&state, jar).await.into_response(),
        AuthRoute::Callback => {
            let query = Query::<CallbackQuery>::try_from_uri(request.uri())
                .map(|Query(query)| query)
                .unwrap_or_default();
            complete_login(&state, jar, query).await.into_response()
        }
        AuthRoute::Protected => {
            let session = state.sessions.load(&jar);
            match AuthenticatedIdentity::from_session(&session) {
                Some(identity) => {
                    GATE_DECISIONS_TOTAL.with_label_values(&["allow"]).inc();
                    request.extensions_mut().insert(identity);
                    next.run(request).await
                }
                None => {
                    GATE_DECISIONS_TOTAL.with_label_values(&["redirect"]).inc();
                    tracing::debug!(
                        path = %request.uri().path(),
                        "Unauthenticated request, redirecting to login"
                    );
                    Redirect::temporary(LOGIN_PATH).into_response()
                }
            }
        }
    }
}

/// Issue a state token, remember it in the session and send the browser to
/// GitHub.
async fn begin_login(state: &AppState, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    let pending = generate_state()?;

    let mut session = state.sessions.load(&jar);
    session.state = Some(pending.clone());
    let jar = state.sessions.save(jar, &session)?;

    LOGINS_STARTED_TOTAL.inc();
    tracing::info!("Starting GitHub login");

    let url = state.oauth.authorization_url(&pending);
    Ok((jar, Redirect::temporary(url.as_str())))
}

/// Validate the returned state, then exchange the code and store the token.
///
/// The session is only written after every step has succeeded.
async fn complete_login(
    state: &AppState,
    jar: CookieJar,
    query: CallbackQuery,
) -> Result<(CookieJar, Redirect)> {
    let mut session = state.sessions.load(&jar);

    let received = query.state.as_deref().unwrap_or_default().trim();
    let expected = session.state.as_deref().unwrap_or_default().trim();

    if expected.is_empty() {
        CALLBACKS_TOTAL.with_label_values(&["no_pending_login"]).inc();
        tracing::warn!("OAuth callback without a pending login");
        return Err(AppError::StateMismatch);
    }

    if received != expected {
        CALLBACKS_TOTAL.with_label_values(&["state_mismatch"]).inc();
        tracing::warn!("OAuth callback state mismatch");
        return Err(AppError::StateMismatch);
    }

    let result = exchange(state, query.code.as_deref()).await;
    let (token, user) = match result {
        Ok(pair) => pair,
        Err(error) => {
            CALLBACKS_TOTAL.with_label_values(&["exchange_failed"]).inc();
            return Err(error);
        }
    };

    session.state = None;
    session.token = Some(token.secret().to_string());
    session.user = Some(user.login);
    let jar = state.sessions.save(jar, &session)?;

    CALLBACKS_TOTAL.with_label_values(&["ok"]).inc();
    tracing::info!(user = ?session.user, "GitHub login completed");

    Ok((jar, Redirect::temporary("/")))
}

async fn exchange(
    state: &AppState,
    code: Option<&str>,
) -> Result<(AccessToken, GitHubUser)> {
    let code = code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::TokenExchange("missing authorization code".to_string()))?;

    let token = state.provider.exchange_code(code).await?;
    let user = state.provider.fetch_user(&token).await?;
    Ok((token, user))
}
