//! Client configuration.
//!
//! # Design
//! `ClientConfig` is assembled once by [`ClientConfigBuilder::build`] and
//! never changes afterwards. The production and test endpoints are named
//! presets resolved at build time, so test mode cannot be undone by a later
//! `base_url` call. Building performs no I/O and cannot fail.

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

pub const PRODUCTION_URL: &str = "https://api.datacite.org/";
pub const TEST_URL: &str = "https://api.test.datacite.org/";
pub const DEFAULT_API_VERSION: &str = "2";

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Production,
    Test,
    Custom(String),
}

impl Endpoint {
    pub fn url(&self) -> &str {
        match self {
            Endpoint::Production => PRODUCTION_URL,
            Endpoint::Test => TEST_URL,
            Endpoint::Custom(url) => url,
        }
    }
}

/// Bound on the duration of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// One limit for the whole call.
    Total(Duration),
    /// Separate limits for establishing the connection and reading the response.
    Split { connect: Duration, read: Duration },
}

/// Immutable settings shared by every request a client sends.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    username: String,
    password: String,
    prefix: String,
    base_url: String,
    api_version: String,
    timeout: Option<Timeout>,
}

impl ClientConfig {
    pub fn builder(
        username: impl Into<String>,
        password: impl Into<String>,
        prefix: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            username: username.into(),
            password: password.into(),
            prefix: prefix.into(),
            base_url: None,
            test_mode: false,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
        }
    }

    /// Read the configuration from `DATACITE_*` environment variables.
    ///
    /// `DATACITE_USERNAME`, `DATACITE_PASSWORD` and `DATACITE_PREFIX` are
    /// required. `DATACITE_URL`, `DATACITE_TEST_MODE` (`1`/`true`) and
    /// `DATACITE_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::InvalidArgument(format!("{key} is not set")))
        };

        let mut builder = ClientConfig::builder(
            required("DATACITE_USERNAME")?,
            required("DATACITE_PASSWORD")?,
            required("DATACITE_PREFIX")?,
        );
        if let Some(url) = lookup("DATACITE_URL").filter(|v| !v.is_empty()) {
            builder = builder.base_url(url);
        }
        if let Some(flag) = lookup("DATACITE_TEST_MODE") {
            builder = builder.test_mode(matches!(flag.trim(), "1" | "true" | "TRUE" | "yes"));
        }
        if let Some(secs) = lookup("DATACITE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::InvalidArgument(format!("DATACITE_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            builder = builder.timeout(Timeout::Total(Duration::from_secs(secs)));
        }
        Ok(builder.build())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Base URL, always ending in exactly one `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Accepted for compatibility; no request depends on it yet.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn timeout(&self) -> Option<Timeout> {
        self.timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    username: String,
    password: String,
    prefix: String,
    base_url: Option<String>,
    test_mode: bool,
    api_version: String,
    timeout: Option<Timeout>,
}

impl ClientConfigBuilder {
    /// Explicit base URL. Ignored when test mode is on.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Send everything to the DataCite test endpoint.
    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ClientConfig {
        let endpoint = match (self.test_mode, self.base_url) {
            (true, _) => Endpoint::Test,
            (false, Some(url)) => Endpoint::Custom(url),
            (false, None) => Endpoint::Production,
        };
        ClientConfig {
            username: self.username,
            password: self.password,
            prefix: self.prefix,
            base_url: normalize_base_url(endpoint.url()),
            api_version: self.api_version,
            timeout: self.timeout,
        }
    }
}

/// Ensure the URL ends in a single `/`.
fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
