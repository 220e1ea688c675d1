//! Authenticated identity handed from the auth gate to handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::session::Session;
use crate::error::AppError;

/// Identity of the caller behind an authenticated session
///
/// Inserted into request extensions by the auth gate; handlers take it as
/// an extractor.
///
/// # Usage
/// ```ignore
/// async fn handler(identity: AuthenticatedIdentity) -> impl IntoResponse {
///     format!("Hello, {}", identity.user().unwrap_or("stranger"))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    user: Option<String>,
}

impl AuthenticatedIdentity {
    /// Identity for a session, or `None` when the session is not
    /// authenticated.
    pub fn from_session(session: &Session) -> Option<Self> {
        if !session.is_authenticated() {
            return None;
        }

        Some(Self {
            user: session.user.clone().filter(|user| !user.is_empty()),
        })
    }

    /// GitHub login, when it was resolved at callback time.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
