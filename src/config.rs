//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::net::IpAddr;
use url::Url;

use crate::auth::CALLBACK_PATH;
use crate::auth::session::expiry_after;
use crate::error::{AppError, Result};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain, optionally with port (e.g., "localhost:8080")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the public base URL
    ///
    /// # Returns
    /// Full URL like "https://gate.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Authentication configuration (GitHub OAuth + session cookie)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session signing secret (32+ bytes). No default is shipped.
    pub session_secret: String,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Optional session lifetime in seconds.
    ///
    /// When unset the cookie lives for the browser session.
    #[serde(default)]
    pub session_max_age: Option<i64>,
    pub github: GitHubOAuthConfig,
}

/// GitHub OAuth configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute callback URL registered with GitHub.
    ///
    /// Defaults to `{server.base_url}/auth/github/callback`.
    #[serde(default)]
    pub redirect_url: Option<Url>,
    pub authorize_url: Url,
    pub token_url: Url,
    /// REST API root used to resolve the signed-in user
    pub api_url: Url,
    /// Back-channel request timeout
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Default `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub fn filter_directives(&self) -> String {
        format!("keygate={},tower_http=debug", self.level.to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (KEYGATE__*)
    ///
    /// `auth.session_secret`, `auth.github.client_id` and
    /// `auth.github.client_secret` have no defaults and must be provided.
    ///
    /// # Errors
    /// Returns error if configuration is missing or invalid
    pub fn load() -> Result<Self> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost:8080")?
            .set_default("server.protocol", "http")?
            .set_default("auth.cookie_name", "github-auth-session")?
            .set_default(
                "auth.github.authorize_url",
                "https://github.com/login/oauth/authorize",
            )?
            .set_default(
                "auth.github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("auth.github.api_url", "https://api.github.com")?
            .set_default("auth.github.timeout_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("KEYGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    /// Callback URL sent to GitHub in both the authorize and token requests.
    pub fn redirect_url(&self) -> Result<Url> {
        if let Some(url) = &self.auth.github.redirect_url {
            return Ok(url.clone());
        }

        let raw = format!("{}{}", self.server.base_url(), CALLBACK_PATH);
        Url::parse(&raw).map_err(|e| AppError::Config(format!("invalid redirect url {raw}: {e}")))
    }

    fn validate(&self) -> Result<()> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.auth.github.client_id.trim().is_empty() {
            return Err(AppError::Config(
                "auth.github.client_id must not be empty".to_string(),
            ));
        }

        if self.auth.github.client_secret.trim().is_empty() {
            return Err(AppError::Config(
                "auth.github.client_secret must not be empty".to_string(),
            ));
        }

        if let Some(max_age) = self.auth.session_max_age {
            if max_age <= 0 {
                return Err(AppError::Config(
                    "auth.session_max_age must be greater than 0".to_string(),
                ));
            }
            if expiry_after(max_age).is_none() {
                return Err(AppError::Config(format!(
                    "auth.session_max_age {max_age} is too large"
                )));
            }
        }

        if self.auth.github.timeout_seconds == 0 {
            return Err(AppError::Config(
                "auth.github.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(AppError::Config(format!(
                "logging.level {:?} is not a log level",
                self.logging.level
            )));
        }

        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return Err(AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        self.redirect_url()?;

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https")
        {
            return Err(AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    // Url keeps the brackets around IPv6 hosts.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
