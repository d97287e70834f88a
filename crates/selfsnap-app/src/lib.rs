#![warn(missing_docs)]
//! # selfsnap-app
//!
//! ## Purpose
//! Wires the `selfsnap` workflows to the real world: HTTP, the terminal, the
//! system browser and process configuration.
//!
//! ## Responsibilities
//! - Provide the reqwest-backed transport for login and submission.
//! - Resolve the backend base URL from flags, environment and `.env`.
//! - Apply host file selections to the form with operator feedback.
//! - Initialise tracing and keep secrets out of log lines.
//!
//! ## Data flow
//! CLI args -> [`AppConfig`] -> [`HttpBackend`] -> `DeviceLoginFlow` /
//! `SubmissionController` -> [`TerminalNotifier`].
//!
//! ## Error model
//! Setup failures are wrapped in [`AppError`]. Workflow failures are reported
//! through the notifier and returned as values by the workflow crates.
//!
//! ## Security and privacy notes
//! - Plain-http backends are accepted for local use but flagged in logs.
//! - Log redaction helpers strip token/code strings.

use std::path::Path;

use selfsnap_core::{
    AcceptedFile, FileDescriptor, PLAIN_TEXT_MIME, RejectionReason, SubmissionForm, validate_file,
};
use selfsnap_ui::{Notifier, file_accepted, file_rejected};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

pub mod browser;
pub mod config;
pub mod http;
pub mod terminal;

pub use browser::SystemBrowser;
pub use config::AppConfig;
pub use http::HttpBackend;
pub use terminal::{TerminalNotifier, TerminalProgress};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SELFSNAP_VERSION");

/// Media type declared for files that are not recognised as plain text.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Applies an operator file selection to the form.
///
/// Only the first file is considered. An empty selection does nothing and
/// emits no notification.
///
/// # Returns
/// `None` for an empty selection, otherwise the validation result. On
/// rejection the form is left untouched.
pub fn apply_file_selection(
    files: &[FileDescriptor],
    form: &mut SubmissionForm,
    notifier: &dyn Notifier,
) -> Option<Result<AcceptedFile, RejectionReason>> {
    let file = files.first()?;

    let result = validate_file(file);
    match &result {
        Ok(accepted) => {
            form.set_host_file_ref(accepted.name.clone());
            info!(host_file = %accepted.name, "host file accepted");
            notifier.notify(file_accepted(&accepted.name));
        }
        Err(reason) => {
            info!(file = %file.name, %reason, "host file rejected");
            notifier.notify(file_rejected());
        }
    }

    Some(result)
}

/// Describes a local file the way a file picker would.
///
/// The declared media type is `explicit_mime` when given, otherwise derived
/// from the extension: `.txt` declares `text/plain`, anything else
/// [`FALLBACK_MIME`].
///
/// # Errors
/// Returns [`AppError::HostFile`] when the path is not a readable regular
/// file or has no UTF-8 file name.
pub fn describe_local_file(
    path: &Path,
    explicit_mime: Option<&str>,
) -> Result<FileDescriptor, AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|error| AppError::HostFile(format!("{}: {error}", path.display())))?;
    if !metadata.is_file() {
        return Err(AppError::HostFile(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::HostFile(format!("{} has no usable name", path.display())))?;

    let mime_type = match explicit_mime {
        Some(mime) => mime.to_string(),
        None => mime_from_extension(path).to_string(),
    };
    debug!(file = name, mime = %mime_type, "described local file");

    Ok(FileDescriptor::new(name, mime_type))
}

fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some(extension) if extension.eq_ignore_ascii_case("txt") => PLAIN_TEXT_MIME,
        _ => FALLBACK_MIME,
    }
}

/// Returns `true` when endpoint URL is HTTPS.
pub fn is_https_endpoint(endpoint: &str) -> bool {
    Url::parse(endpoint)
        .map(|url| url.scheme() == "https")
        .unwrap_or(false)
}

/// Keys whose `key=value` / `key: value` values never reach the logs.
const SECRET_KEYS: [&str; 5] = ["access_token", "authorization", "password", "token", "user_code"];

/// Auth schemes whose credential follows after a space.
const AUTH_SCHEMES: [&str; 2] = ["bearer", "basic"];

/// Replaces secret values with `<redacted>`, keeping the surrounding text.
///
/// Only values are replaced: `status 401: tokens expired` is left alone while
/// `token=abc` becomes `token=<redacted>`.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(value_start) = next_secret_value(rest) {
        let value_end = value_start + secret_value_len(&rest[value_start..]);
        redacted.push_str(&rest[..value_start]);
        redacted.push_str("<redacted>");
        rest = &rest[value_end..];
    }

    redacted.push_str(rest);
    redacted
}

/// Byte offset of the earliest secret value in `text`.
fn next_secret_value(text: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let keyed = SECRET_KEYS.iter().filter_map(|key| {
        lower.match_indices(key).find_map(|(position, _)| {
            let after = position + key.len();
            if !starts_word(&lower, position) {
                return None;
            }
            let separator = lower[after..].chars().next()?;
            if separator != '=' && separator != ':' {
                return None;
            }
            let value = after + 1;
            Some(value + leading_spaces(&lower[value..]))
        })
    });
    let schemes = AUTH_SCHEMES.iter().filter_map(|scheme| {
        lower.match_indices(scheme).find_map(|(position, _)| {
            let after = position + scheme.len();
            let spaces = leading_spaces(&lower[after..]);
            (starts_word(&lower, position) && spaces > 0).then_some(after + spaces)
        })
    });

    keyed
        .chain(schemes)
        .filter(|&value| secret_value_len(&text[value..]) > 0)
        .min()
}

/// Length of the value starting at the front of `text`, including a
/// credential that follows an auth scheme word.
fn secret_value_len(text: &str) -> usize {
    let token_len = |text: &str| {
        text.find(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '&' | '"' | '\''))
            .unwrap_or(text.len())
    };

    let first = token_len(text);
    let is_scheme = AUTH_SCHEMES
        .iter()
        .any(|scheme| text[..first].eq_ignore_ascii_case(scheme));
    if !is_scheme {
        return first;
    }

    let spaces = leading_spaces(&text[first..]);
    let credential = token_len(&text[first + spaces..]);
    if spaces == 0 || credential == 0 {
        return first;
    }
    first + spaces + credential
}

fn starts_word(text: &str, position: usize) -> bool {
    text[..position]
        .chars()
        .next_back()
        .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

fn leading_spaces(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}

/// Initialises the global tracing subscriber.
///
/// Honours `RUST_LOG`, defaulting to `info`. Output goes to stderr so stdout
/// stays clean for command results.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
    /// Host file could not be described.
    #[error("host file error: {0}")]
    HostFile(String),
    /// HTTP client could not be constructed.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
