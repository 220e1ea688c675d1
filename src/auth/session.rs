//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Session data carried by the browser
///
/// `state` is only present while a login is pending; `token` is present once
/// the OAuth callback has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Pending anti-CSRF state token
    #[serde(default)]
    pub state: Option<String>,
    /// GitHub access token
    #[serde(default)]
    pub token: Option<String>,
    /// GitHub login of the token owner
    #[serde(default)]
    pub user: Option<String>,
    /// Absolute expiry, only set when a max age is configured
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session is authenticated when it carries a non-empty token.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at < Utc::now())
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(session: &Session, secret: &str) -> Result<String> {
    let payload =
        serde_json::to_string(session).map_err(|e| AppError::SessionStore(e.to_string()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::SessionStore(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `AppError::SessionStore` if the signature is invalid, the token is
/// malformed, or the session has expired.
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session> {
    let (payload_b64, signature_b64) = token
        .split_once('.')
        .ok_or_else(|| AppError::SessionStore("malformed session token".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::SessionStore(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::SessionStore("malformed session signature".to_string()))?;
    mac.verify_slice(&signature)
        .map_err(|_| AppError::SessionStore("invalid session signature".to_string()))?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::SessionStore("malformed session payload".to_string()))?;
    let session: Session =
        serde_json::from_slice(&payload).map_err(|e| AppError::SessionStore(e.to_string()))?;

    if session.is_expired() {
        return Err(AppError::SessionStore("session expired".to_string()));
    }

    Ok(session)
}

/// Expiry `max_age_secs` from now, or `None` when it is out of range
pub(crate) fn expiry_after(max_age_secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(max_age_secs).and_then(|age| Utc::now().checked_add_signed(age))
}

/// Cookie-backed session store
pub struct SessionStore {
    secret: String,
    cookie_name: String,
    secure: bool,
    /// Session lifetime in seconds
    max_age: Option<i64>,
}

impl SessionStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.auth.session_secret.clone(),
            cookie_name: config.auth.cookie_name.clone(),
            secure: config.should_use_secure_cookies(),
            max_age: config.auth.session_max_age,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Load the session carried by the request.
    ///
    /// Never fails: a missing, tampered or expired cookie yields an empty
    /// session.
    pub fn load(&self, jar: &CookieJar) -> Session {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Session::default();
        };

        match verify_session_token(cookie.value(), &self.secret) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(%error, "Discarding unreadable session cookie");
                Session::default()
            }
        }
    }

    /// Attach the signed session to the outgoing cookie jar.
    pub fn save(&self, jar: CookieJar, session: &Session) -> Result<CookieJar> {
        let mut session = session.clone();
        if let Some(max_age) = self.max_age {
            let expires_at = expiry_after(max_age).ok_or_else(|| {
                AppError::SessionStore(format!("session max age {max_age}s is out of range"))
            })?;
            session.expires_at = Some(expires_at);
        }

        let value = self.encode(&session)?;
        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);

        Ok(jar.add(cookie))
    }

    /// Emit a removal cookie for the session.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/"))
    }

    /// Signed cookie value for a session.
    pub fn encode(&self, session: &Session) -> Result<String> {
        create_session_token(session, &self.secret)
    }
}
