//! read configuration from a file, the environment, or an AWS secret

use std::collections::BTreeMap;
use std::path::Path;

use aws_config::BehaviorVersion;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::errors::Error;
use crate::refresh::RefreshKeys;
use crate::request::TokenMarkers;

pub const DEFAULT_USER_AGENT: &str = "bearer-session-rust/0.1.0";

pub enum ConfigLocation {
    File(String),
    Env,
    Secret,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Base URL relative request paths are resolved against.
    pub base_url: String,
    /// Refresh endpoint, absolute or relative to `base_url`.
    #[serde(default)]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub markers: TokenMarkers,
    #[serde(default)]
    pub refresh_keys: RefreshKeys,
    #[serde(default)]
    pub logout_redirect: Option<String>,
    /// How many times one call may be replayed after refreshes before it fails.
    #[serde(default = "default_max_replays")]
    pub max_replays: u8,
    /// Initial credential, used when the store starts out empty.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Persist the credential to this JSON file instead of keeping it in memory.
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_replays() -> u8 {
    1
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_url: None,
            default_headers: BTreeMap::new(),
            markers: TokenMarkers::default(),
            refresh_keys: RefreshKeys::default(),
            logout_redirect: None,
            max_replays: default_max_replays(),
            access_token: None,
            refresh_token: None,
            token_file: None,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = Some(url.into());
        self
    }

    pub fn with_tokens(mut self, access: impl Into<String>, refresh: Option<String>) -> Self {
        self.access_token = Some(access.into());
        self.refresh_token = refresh;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_logout_redirect(mut self, url: impl Into<String>) -> Self {
        self.logout_redirect = Some(url.into());
        self
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// # ENV Vars
    /// * `BEARER_BASE_URL` - required
    /// * `BEARER_REFRESH_URL`, `BEARER_ACCESS_TOKEN`, `BEARER_REFRESH_TOKEN`,
    ///   `BEARER_LOGOUT_REDIRECT`, `BEARER_TOKEN_FILE`, `BEARER_MAX_REPLAYS` - optional
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let base_url = lookup("BEARER_BASE_URL")
            .ok_or_else(|| Error::Config("Missing BEARER_BASE_URL env var".to_string()))?;
        let mut config = Config::new(base_url);
        config.refresh_url = lookup("BEARER_REFRESH_URL");
        config.access_token = lookup("BEARER_ACCESS_TOKEN");
        config.refresh_token = lookup("BEARER_REFRESH_TOKEN");
        config.logout_redirect = lookup("BEARER_LOGOUT_REDIRECT");
        config.token_file = lookup("BEARER_TOKEN_FILE");
        if let Some(raw) = lookup("BEARER_MAX_REPLAYS") {
            config.max_replays = raw.parse().map_err(|_| {
                Error::Config(format!("BEARER_MAX_REPLAYS must be 0-255, got '{raw}'"))
            })?;
        }
        Ok(config)
    }

    /// Reads the JSON config stored in the secret named by `BEARER_CONFIG_SECRET_ARN`.
    pub async fn from_secret() -> Result<Self, Error> {
        let secret_arn = std::env::var("BEARER_CONFIG_SECRET_ARN")
            .map_err(|_| Error::Config("Missing BEARER_CONFIG_SECRET_ARN env var".to_string()))?;
        let client = aws_sdk_secretsmanager::Client::new(
            &aws_config::load_defaults(BehaviorVersion::latest()).await,
        );
        let resp = client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| Error::Config(format!("Failed to get secret: {}", e)))?;
        let secret = resp.secret_string().ok_or_else(|| {
            Error::Config("Failed to get secret string, returned None".to_string())
        })?;
        Ok(serde_json::from_str(secret)?)
    }

    pub async fn load(loc: ConfigLocation) -> Result<Self, Error> {
        match loc {
            ConfigLocation::File(path) => Self::from_file(path),
            ConfigLocation::Env => Self::from_env(),
            ConfigLocation::Secret => Self::from_secret().await,
        }
    }

    /// `base_url` with a scheme, without a trailing slash.
    pub fn base(&self) -> String {
        let base = if self.base_url.starts_with("http") {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        };
        base.trim_end_matches('/').to_string()
    }

    pub fn validate(&self) -> Result<(), Error> {
        let base = self.base();
        reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        self.header_map()?;
        Ok(())
    }

    /// Default headers as sent on every request, `User-Agent` included.
    pub fn header_map(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| Error::Config(format!("Invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("Invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// Resolves a request path against `base_url`; absolute URLs pass through.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base(), url.trim_start_matches('/'))
        }
    }
}
