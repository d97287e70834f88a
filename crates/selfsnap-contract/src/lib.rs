#![warn(missing_docs)]
//! # selfsnap-contract
//!
//! ## Purpose
//! Defines the snapshot service wire contract and client-side parsing helpers.
//!
//! ## Responsibilities
//! - Build the `POST /api/create-snapshots` request body from a form snapshot.
//! - Parse the device-login initiation and snapshot summary responses.
//! - Extract the optional `error` field from failure bodies.
//! - Describe raw HTTP replies independently of any client library.
//!
//! ## Data flow
//! [`SubmissionForm`] -> [`CreateSnapshotsRequest`] -> transport ->
//! [`HttpReply`] -> [`parse_snapshot_summary`] or [`extract_error_message`].
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs so they never borrow from transient
//! network buffers.
//!
//! ## Error model
//! Invalid JSON or bodies that break contract invariants return
//! [`ContractError`]. Transport-level failures are carried as
//! [`TransportFailure`].

use selfsnap_core::SubmissionForm;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Device-login initiation path.
pub const LOGIN_PATH: &str = "/api/azure-login";

/// Snapshot creation path.
pub const CREATE_SNAPSHOTS_PATH: &str = "/api/create-snapshots";

/// Body of `POST /api/create-snapshots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSnapshotsRequest {
    /// Reference name of the VM list file.
    pub host_file: String,
    /// Change-ticket identifier.
    pub chg_number: String,
    /// Snapshot time-to-live in days.
    pub ttl_duration: u32,
}

impl CreateSnapshotsRequest {
    /// Copies the submitted fields out of a form snapshot.
    pub fn from_form(form: &SubmissionForm) -> Self {
        Self {
            host_file: form.host_file_ref().to_string(),
            chg_number: form.change_number().to_string(),
            ttl_duration: form.ttl_duration_days(),
        }
    }

    /// Serializes request to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`ContractError::Decode`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(ContractError::Decode)
    }
}

/// Short stable fingerprint of a request, used to correlate log lines.
pub fn request_fingerprint(request: &CreateSnapshotsRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.host_file.as_bytes());
    hasher.update([0]);
    hasher.update(request.chg_number.as_bytes());
    hasher.update([0]);
    hasher.update(request.ttl_duration.to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

/// Successful `GET /api/azure-login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInitiationResponse {
    /// Verification page the operator must visit.
    pub login_url: String,
    /// Code the operator types on the verification page.
    pub user_code: String,
}

/// Successful `POST /api/create-snapshots` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// VMs listed in the host file.
    pub total_vms: u64,
    /// Snapshots created.
    pub successful_snapshots: u64,
    /// Snapshots that could not be created.
    pub failed_snapshots: u64,
}

impl SnapshotSummary {
    /// Returns `true` when every listed VM is either snapshotted or failed.
    pub fn is_consistent(&self) -> bool {
        self.successful_snapshots.checked_add(self.failed_snapshots) == Some(self.total_vms)
    }
}

/// Failure body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure reason.
    #[serde(default)]
    pub error: Option<String>,
}

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Creates a reply from status and body bytes.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure: no HTTP reply was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {0}")]
pub struct TransportFailure(pub String);

/// Parses a device-login initiation body.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON.
/// Returns [`ContractError::InvalidContract`] when either field is blank.
pub fn parse_login_initiation(raw: &[u8]) -> Result<LoginInitiationResponse, ContractError> {
    let parsed: LoginInitiationResponse =
        serde_json::from_slice(raw).map_err(ContractError::Decode)?;

    if parsed.login_url.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "login_url is empty".to_string(),
        ));
    }

    if parsed.user_code.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "user_code is empty".to_string(),
        ));
    }

    Ok(parsed)
}

/// Parses a snapshot summary body.
///
/// Counters are returned as sent, even when they do not add up; see
/// [`SnapshotSummary::is_consistent`].
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON or missing counters.
pub fn parse_snapshot_summary(raw: &[u8]) -> Result<SnapshotSummary, ContractError> {
    serde_json::from_slice(raw).map_err(ContractError::Decode)
}

/// Returns the non-blank `error` field of a body, if any.
///
/// Bodies that are not JSON objects yield `None`.
pub fn extract_error_message(raw: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(raw).ok()?;
    parsed
        .error
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

/// Wire contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON encode/decode failure.
    #[error("contract decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("contract violation: {0}")]
    InvalidContract(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for body parsing and request shaping.

    use super::*;

    #[test]
    fn summary_consistency_handles_counter_overflow() {
        let summary = SnapshotSummary {
            total_vms: 0,
            successful_snapshots: u64::MAX,
            failed_snapshots: 1,
        };
        assert!(!summary.is_consistent());
    }

    #[test]
    fn error_message_ignores_blank_and_non_object_bodies() {
        assert_eq!(extract_error_message(br#"{"error":"   "}"#), None);
        assert_eq!(extract_error_message(b"<html>502</html>"), None);
        assert_eq!(extract_error_message(b""), None);
        assert_eq!(
            extract_error_message(br#"{"error":"CHG not approved"}"#),
            Some("CHG not approved".to_string())
        );
    }

    #[test]
    fn fingerprint_changes_with_ttl() {
        let mut request = CreateSnapshotsRequest {
            host_file: "vms.txt".to_string(),
            chg_number: "CHG1".to_string(),
            ttl_duration: 7,
        };
        let first = request_fingerprint(&request);
        request.ttl_duration = 8;
        assert_ne!(first, request_fingerprint(&request));
        assert_eq!(first.len(), 12);
    }
}
