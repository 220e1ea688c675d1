//! Keygate - GitHub login in front of a small per-user value store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Auth Gate (Axum)                        │
//! │  - /auth/github/login    -> redirect to GitHub              │
//! │  - /auth/github/callback -> verify state, exchange code     │
//! │  - everything else       -> session token or redirect       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer                               │
//! │  - User value lookup / admin value set                      │
//! │  - Metrics                                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - In-memory user values                                    │
//! │  - Signed session cookies (client side)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers behind the gate
//! - `auth`: GitHub OAuth flow, sessions and the gate
//! - `data`: In-memory value store
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;

#[cfg(test)]
pub(crate) mod test_utils;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Cookie-backed session store
    pub sessions: Arc<auth::SessionStore>,

    /// Authorization URL builder
    pub oauth: Arc<auth::OAuthClient>,

    /// Token exchange and user lookup
    pub provider: Arc<dyn auth::OAuthProvider>,

    /// User value table
    pub values: data::UserValues,
}

impl AppState {
    /// Initialize application state with the GitHub back channel
    ///
    /// # Errors
    /// Returns error if the redirect URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: config::AppConfig) -> error::Result<Self> {
        let provider = Arc::new(auth::GitHubProvider::new(&config)?);
        Self::with_provider(config, provider)
    }

    /// Initialize application state with a custom back channel
    pub fn with_provider(
        config: config::AppConfig,
        provider: Arc<dyn auth::OAuthProvider>,
    ) -> error::Result<Self> {
        tracing::info!("Initializing application state...");

        let sessions = auth::SessionStore::new(&config);
        let oauth = auth::OAuthClient::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            oauth: Arc::new(oauth),
            provider,
            values: data::UserValues::new(),
        })
    }
}

/// Build the Axum router with all routes.
///
/// Shared by the binary and integration tests. The auth gate wraps every
/// route and the fallback, so login and callback paths are answered by the
/// gate without a dedicated handler.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::trace::TraceLayer;

    Router::new()
        .merge(api::user_router())
        .merge(api::admin_router())
        .merge(auth::auth_router())
        .merge(api::metrics_router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_gate,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span without the query string, which carries the OAuth `code`
/// and `state` on callbacks.
fn request_span(request: &axum::extract::Request) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

async fn not_found() -> error::AppError {
    error::AppError::NotFound
}
