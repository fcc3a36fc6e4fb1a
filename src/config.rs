//! Gateway configuration: credentials, bearer token and environment selection

use crate::{BlackoinError, Result};
use std::env;
use std::fmt;

/// Production API base URL
pub const PRODUCTION_URL: &str = "https://app.blackoin.com/api/";

/// Staging API base URL, selected by debug mode
pub const STAGING_URL: &str = "https://staging.blackoin.com/api/";

/// Environment variable holding the client ID read by [`GatewayConfig::from_env`]
pub const CLIENT_ID_VAR: &str = "BLACKOIN_CLIENT_ID";

/// Environment variable holding the client secret read by [`GatewayConfig::from_env`]
pub const CLIENT_SECRET_VAR: &str = "BLACKOIN_CLIENT_SECRET";

/// Environment variable toggling debug mode read by [`GatewayConfig::from_env`]
pub const DEBUG_VAR: &str = "BLACKOIN_DEBUG";

/// API environment derived from the debug flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
}

impl Environment {
    /// Base URL every request path is appended to
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_URL,
            Self::Staging => STAGING_URL,
        }
    }
}

/// Process-wide gateway state shared by every request.
///
/// Create one instance, configure it, and pass it by reference to each call.
/// Mutation requires `&mut`, so updating the bearer token while requests hold
/// a borrow is rejected at compile time; callers sharing a configuration
/// across tasks wrap it in their own lock.
#[derive(Clone, Default)]
pub struct GatewayConfig {
    debug: bool,
    client_id: Option<String>,
    client_secret: Option<String>,
    bearer_token: Option<String>,
    base_url_override: Option<String>,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("debug", &self.debug)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("base_url_override", &self.base_url_override)
            .finish()
    }
}

impl GatewayConfig {
    /// Create an empty production configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `BLACKOIN_CLIENT_ID`, `BLACKOIN_CLIENT_SECRET`
    /// and `BLACKOIN_DEBUG`.
    ///
    /// Missing credentials are left unset and reported by
    /// [`credentials`](Self::credentials) when a token is requested.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.set_debug(env::var(DEBUG_VAR).map(|v| parse_flag(&v)).unwrap_or(false));

        let client_id = env::var(CLIENT_ID_VAR).unwrap_or_default();
        let client_secret = env::var(CLIENT_SECRET_VAR).unwrap_or_default();
        if let Err(e) = config.set_credentials(client_id, client_secret) {
            tracing::warn!("Blackoin credentials not loaded from environment: {e}");
        }

        config
    }

    /// Store the client credentials used to request bearer tokens
    pub fn set_credentials(
        &mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<&mut Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(BlackoinError::config(
                "clientId and clientSecret cannot be empty",
            ));
        }

        self.client_id = Some(client_id);
        self.client_secret = Some(client_secret);
        Ok(self)
    }

    /// Builder form of [`set_credentials`](Self::set_credentials)
    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        self.set_credentials(client_id, client_secret)?;
        Ok(self)
    }

    /// Toggle debug mode: staging URL and no TLS certificate verification
    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    /// Builder form of [`set_debug`](Self::set_debug)
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.set_debug(debug);
        self
    }

    /// Store the token sent as `Authorization: Bearer <token>`.
    ///
    /// Expiry is not tracked; request a new token when the API reports it as expired.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Builder form of [`set_bearer_token`](Self::set_bearer_token)
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.set_bearer_token(token);
        self
    }

    /// Send requests to `url` instead of the environment base URL.
    ///
    /// Intended for proxies and mock servers. The path of each request is
    /// appended verbatim, so the URL should end with `/`.
    pub fn with_base_url_override(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    /// Whether debug mode is active
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Environment selected by the debug flag
    pub fn environment(&self) -> Environment {
        if self.debug {
            Environment::Staging
        } else {
            Environment::Production
        }
    }

    /// Base URL for the current state
    pub fn base_url(&self) -> &str {
        match &self.base_url_override {
            Some(url) => url,
            None => self.environment().base_url(),
        }
    }

    /// Client ID and secret, failing when either has not been set
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(BlackoinError::config(
                "Blackoin clientId and clientSecret must be set",
            )),
        }
    }

    /// Current bearer token, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Validate the configured base URL
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url();
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(BlackoinError::config(
                "Base URL must start with http:// or https://",
            ));
        }

        url::Url::parse(base)
            .map_err(|e| BlackoinError::config(format!("Invalid base URL {base}: {e}")))?;

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_are_rejected() {
        for (id, secret) in [("", ""), ("id", ""), ("", "secret")] {
            let mut config = GatewayConfig::new();
            let result = config.set_credentials(id, secret);
            assert!(
                matches!(result, Err(BlackoinError::InvalidConfig { .. })),
                "expected InvalidConfig for ({id:?}, {secret:?})"
            );
        }
    }

    #[test]
    fn test_rejected_credentials_keep_previous_pair() {
        let mut config = GatewayConfig::new()
            .with_credentials("id", "secret")
            .unwrap();
        assert!(config.set_credentials("", "other").is_err());
        assert_eq!(config.credentials().unwrap(), ("id", "secret"));
    }

    #[test]
    fn test_credentials_unset() {
        let config = GatewayConfig::new();
        assert!(matches!(
            config.credentials(),
            Err(BlackoinError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_base_url_follows_debug_flag() {
        let mut config = GatewayConfig::new();
        assert_eq!(config.base_url(), PRODUCTION_URL);
        assert_eq!(config.environment(), Environment::Production);

        config.set_debug(true);
        assert_eq!(config.base_url(), STAGING_URL);
        assert_eq!(config.environment(), Environment::Staging);

        config.set_debug(false);
        assert_eq!(config.base_url(), PRODUCTION_URL);
    }

    #[test]
    fn test_base_url_override_wins() {
        let config = GatewayConfig::new()
            .with_debug(true)
            .with_base_url_override("http://127.0.0.1:1234/");
        assert_eq!(config.base_url(), "http://127.0.0.1:1234/");
        assert!(config.is_debug());
    }

    #[test]
    fn test_bearer_token() {
        let mut config = GatewayConfig::new();
        assert_eq!(config.bearer_token(), None);
        config.set_bearer_token("abc");
        assert_eq!(config.bearer_token(), Some("abc"));
        config.set_bearer_token("def");
        assert_eq!(config.bearer_token(), Some("def"));
    }

    #[test]
    fn test_validate() {
        assert!(GatewayConfig::new().validate().is_ok());
        assert!(GatewayConfig::new().with_debug(true).validate().is_ok());
        assert!(GatewayConfig::new()
            .with_base_url_override("ftp://example.com/")
            .validate()
            .is_err());
        assert!(GatewayConfig::new()
            .with_base_url_override("")
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = GatewayConfig::new()
            .with_credentials("client", "super-secret")
            .unwrap()
            .with_bearer_token("token-value");
        let output = format!("{config:?}");
        assert!(output.contains("client"));
        assert!(!output.contains("super-secret"));
        assert!(!output.contains("token-value"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
