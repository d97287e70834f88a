#![warn(missing_docs)]
//! # selfsnap-auth
//!
//! ## Purpose
//! Starts the identity provider's device-code login on behalf of the
//! operator.
//!
//! ## Responsibilities
//! - Request a login URL and user code from the backend, exactly once.
//! - Open the login URL in a separate browsing context.
//! - Keep the user code visible until the operator dismisses it.
//!
//! ## Data flow
//! [`DeviceLoginFlow::begin_login`] calls [`LoginTransport`] -> parses the
//! reply into a [`DeviceLoginSession`] -> [`BrowserLauncher`] opens the URL ->
//! [`Notifier`] shows the code.
//!
//! ## Ownership and lifetimes
//! Session values are owned `String`s, decoupled from transport buffers.
//!
//! ## Error model
//! Every failure (network, non-2xx, malformed body) is
//! [`LoginError::InitiationFailed`]. There are no retries and no polling: the
//! device-code exchange completes out-of-band.
//!
//! ## Security and privacy notes
//! The user code is never logged.

use std::sync::Arc;

use async_trait::async_trait;
use selfsnap_contract::{HttpReply, TransportFailure, extract_error_message, parse_login_initiation};
use selfsnap_ui::{Notifier, login_code, login_failed};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Login URL and user code returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLoginSession {
    /// Verification page the operator must visit.
    pub login_url: String,
    /// Code the operator types on the verification page.
    pub user_code: String,
}

/// Abstract transport for the login-initiation endpoint.
#[async_trait]
pub trait LoginTransport: Send + Sync {
    /// Issues one `GET /api/azure-login` request.
    async fn request_device_login(&self) -> Result<HttpReply, TransportFailure>;
}

/// Opens URLs in a browsing context independent of the caller.
pub trait BrowserLauncher: Send + Sync {
    /// Opens `url` without blocking on the browser.
    ///
    /// # Errors
    /// Returns [`LaunchError`] when no browser could be started.
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

/// Browser launch failure.
#[derive(Debug, Error)]
#[error("browser launch failed: {0}")]
pub struct LaunchError(pub String);

/// Device-code login initiation.
#[derive(Clone)]
pub struct DeviceLoginFlow {
    transport: Arc<dyn LoginTransport>,
    launcher: Arc<dyn BrowserLauncher>,
    notifier: Arc<dyn Notifier>,
}

impl DeviceLoginFlow {
    /// Creates a flow over injected transport, launcher and notifier.
    pub fn new(
        transport: Arc<dyn LoginTransport>,
        launcher: Arc<dyn BrowserLauncher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            launcher,
            notifier,
        }
    }

    /// Initiates device login and surfaces the user code.
    ///
    /// On success the login URL is opened and a persistent notification
    /// carries the code. A browser that fails to open is logged only, since
    /// the operator can still visit the URL by hand.
    ///
    /// # Errors
    /// Returns [`LoginError::InitiationFailed`] after notifying the operator.
    pub async fn begin_login(&self) -> Result<DeviceLoginSession, LoginError> {
        let session = match self.initiate().await {
            Ok(session) => session,
            Err(error) => {
                warn!(%error, "device login initiation failed");
                self.notifier.notify(login_failed());
                return Err(error);
            }
        };

        info!(login_url = %session.login_url, "device login initiated");

        if let Err(error) = self.launcher.open(&session.login_url) {
            warn!(%error, login_url = %session.login_url, "could not open login url");
        }

        self.notifier.notify(login_code(&session.user_code));
        Ok(session)
    }

    async fn initiate(&self) -> Result<DeviceLoginSession, LoginError> {
        let reply = self
            .transport
            .request_device_login()
            .await
            .map_err(|error| LoginError::InitiationFailed(error.to_string()))?;

        if !reply.is_success() {
            let reason = extract_error_message(&reply.body)
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(LoginError::InitiationFailed(format!(
                "backend returned status {}: {reason}",
                reply.status
            )));
        }

        let parsed = parse_login_initiation(&reply.body)
            .map_err(|error| LoginError::InitiationFailed(error.to_string()))?;
        validate_login_url(&parsed.login_url)?;

        Ok(DeviceLoginSession {
            login_url: parsed.login_url,
            user_code: parsed.user_code,
        })
    }
}

/// Validates that a login URL can be handed to a browser.
///
/// # Errors
/// Returns [`LoginError::InitiationFailed`] for unparsable URLs or schemes
/// other than `http`/`https`.
pub fn validate_login_url(login_url: &str) -> Result<(), LoginError> {
    let parsed = Url::parse(login_url)
        .map_err(|error| LoginError::InitiationFailed(format!("invalid login url: {error}")))?;

    match parsed.scheme() {
        "https" | "http" => Ok(()),
        scheme => Err(LoginError::InitiationFailed(format!(
            "login url scheme {scheme} cannot be opened in a browser"
        ))),
    }
}

/// Errors produced by the device-login flow.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Network failure, non-2xx status or malformed body.
    #[error("device login initiation failed: {0}")]
    InitiationFailed(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for login URL policy.

    use super::*;

    #[test]
    fn login_url_must_be_browsable() {
        validate_login_url("https://microsoft.com/devicelogin").expect("https should pass");
        assert!(validate_login_url("javascript:alert(1)").is_err());
        assert!(validate_login_url("not a url").is_err());
    }
}
