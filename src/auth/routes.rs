//! Session routes that sit behind the auth gate

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::post,
};
use axum_extra::extract::CookieJar;

use super::identity::AuthenticatedIdentity;
use crate::AppState;

/// Create authentication router
///
/// Routes:
/// - POST /logout - Clear the session
///
/// Login and callback are answered by the auth gate itself.
pub fn auth_router() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// POST /logout
///
/// Clears the session cookie and sends the browser back to the root,
/// which restarts the login flow.
async fn logout(
    State(state): State<AppState>,
    identity: AuthenticatedIdentity,
    jar: CookieJar,
) -> impl IntoResponse {
    tracing::info!(user = ?identity.user(), "Logging out");
    (state.sessions.clear(jar), Redirect::to("/"))
}
