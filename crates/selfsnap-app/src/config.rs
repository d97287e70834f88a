//! Backend location resolution.

use tracing::warn;
use url::Url;

use crate::{AppError, is_https_endpoint};

/// Environment variable naming the snapshot service base URL.
pub const API_URL_ENV: &str = "SELFSNAP_API_URL";

/// Base URL used when neither flag nor environment provides one.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Snapshot service base URL, always ending in `/`.
    pub base_url: Url,
}

impl AppConfig {
    /// Resolves configuration: explicit value, then [`API_URL_ENV`], then
    /// [`DEFAULT_API_URL`].
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the chosen URL is invalid.
    pub fn resolve(explicit_base_url: Option<&str>) -> Result<Self, AppError> {
        let raw = match explicit_base_url {
            Some(value) => value.to_string(),
            None => std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        Self::from_base_url(&raw)
    }

    /// Builds configuration from one base URL.
    ///
    /// A path prefix is kept, so `https://ops.example/snap` serves
    /// `https://ops.example/snap/api/azure-login`.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for unparsable URLs, schemes other than
    /// `http`/`https`, or URLs without a host.
    pub fn from_base_url(raw: &str) -> Result<Self, AppError> {
        let mut base_url = Url::parse(raw.trim())
            .map_err(|error| AppError::Config(format!("invalid base url {raw:?}: {error}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "base url must use http or https, got {}",
                base_url.scheme()
            )));
        }

        if base_url.host_str().is_none() {
            return Err(AppError::Config("base url has no host".to_string()));
        }

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);

        if !is_https_endpoint(base_url.as_str()) {
            warn!(base_url = %base_url, "snapshot service is reached over plain http");
        }

        Ok(Self { base_url })
    }

    /// Absolute URL of an API path such as `/api/azure-login`.
    ///
    /// # Errors
    /// Returns the parse error when `path` cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}
