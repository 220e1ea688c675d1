//! GitHub OAuth authentication
//!
//! Handles:
//! - State token generation
//! - Cookie-backed sessions
//! - GitHub OAuth flow
//! - The auth gate in front of every route

mod identity;
mod middleware;
mod oauth;
mod routes;
pub mod session;
mod state_token;

pub use identity::AuthenticatedIdentity;
pub use middleware::{AuthRoute, CALLBACK_PATH, CallbackQuery, LOGIN_PATH, auth_gate};
pub use oauth::{AccessToken, GitHubProvider, GitHubUser, OAuthClient, OAuthProvider};
pub use routes::auth_router;
pub use session::{Session, SessionStore, create_session_token, verify_session_token};
pub use state_token::{STATE_TOKEN_LEN, generate_state};
