#![warn(missing_docs)]
//! # selfsnap-core
//!
//! ## Purpose
//! Defines the pure data model used across the `selfsnap` workspace.
//!
//! ## Responsibilities
//! - Validate operator-selected host files against the plain-text policy.
//! - Hold the mutable submission form and decide whether it can be submitted.
//! - Track upload progress as a bounded, monotonic percentage.
//!
//! ## Data flow
//! A selected [`FileDescriptor`] passes through [`validate_file`], and the
//! resulting [`AcceptedFile`] name is stored in [`SubmissionForm`]. At submit
//! time the form is cloned into a snapshot and upload byte counts are folded
//! into [`SubmissionProgress`].
//!
//! ## Ownership and lifetimes
//! The form owns its strings so a snapshot can be handed to the network layer
//! while the live form keeps accepting edits.
//!
//! ## Error model
//! File policy violations return [`RejectionReason`]. Incomplete forms return
//! [`FormError`]. Neither ever reaches the network.
//!
//! ## Example
//! ```rust
//! use selfsnap_core::{FileDescriptor, SubmissionForm, validate_file};
//!
//! let mut form = SubmissionForm::new();
//! let accepted = validate_file(&FileDescriptor::new("vms.txt", "text/plain")).unwrap();
//! form.set_host_file_ref(accepted.name);
//! form.set_change_number("CHG0012345");
//! assert!(form.is_submittable());
//! ```

use thiserror::Error;

/// The only media type accepted for host files.
pub const PLAIN_TEXT_MIME: &str = "text/plain";

/// Snapshot time-to-live applied when the operator does not change it.
pub const DEFAULT_TTL_DAYS: u32 = 7;

/// Smallest accepted snapshot time-to-live.
pub const MIN_TTL_DAYS: u32 = 1;

/// Candidate file chosen by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// File name as reported by the selection source.
    pub name: String,
    /// Declared media type.
    pub mime_type: String,
}

impl FileDescriptor {
    /// Creates a descriptor from a name and declared media type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// File that passed the host-file policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    /// Reference name stored in the form.
    pub name: String,
}

/// Why a candidate host file was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    /// Declared media type is not `text/plain`.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Applies the plain-text policy to one candidate file.
///
/// The comparison is exact: `text/plain; charset=utf-8` or `TEXT/PLAIN` are
/// not the declared plain-text type and are refused.
///
/// # Errors
/// Returns [`RejectionReason::UnsupportedType`] for any other media type.
pub fn validate_file(file: &FileDescriptor) -> Result<AcceptedFile, RejectionReason> {
    if file.mime_type != PLAIN_TEXT_MIME {
        return Err(RejectionReason::UnsupportedType(file.mime_type.clone()));
    }

    Ok(AcceptedFile {
        name: file.name.clone(),
    })
}

/// Mutable submission parameters edited by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionForm {
    host_file_ref: String,
    change_number: String,
    ttl_duration_days: u32,
}

impl SubmissionForm {
    /// Creates an empty form with the default time-to-live.
    pub fn new() -> Self {
        Self {
            host_file_ref: String::new(),
            change_number: String::new(),
            ttl_duration_days: DEFAULT_TTL_DAYS,
        }
    }

    /// Name of the accepted host file, empty until one is accepted.
    pub fn host_file_ref(&self) -> &str {
        &self.host_file_ref
    }

    /// Change-ticket identifier.
    pub fn change_number(&self) -> &str {
        &self.change_number
    }

    /// Snapshot time-to-live in days.
    pub fn ttl_duration_days(&self) -> u32 {
        self.ttl_duration_days
    }

    /// Stores the reference name of an accepted host file.
    pub fn set_host_file_ref(&mut self, name: impl Into<String>) {
        self.host_file_ref = name.into();
    }

    /// Stores the change-ticket identifier.
    pub fn set_change_number(&mut self, change_number: impl Into<String>) {
        self.change_number = change_number.into();
    }

    /// Stores a numeric time-to-live as-is.
    ///
    /// Values below [`MIN_TTL_DAYS`] are kept so the submit-time check can
    /// refuse them.
    pub fn set_ttl_duration_days(&mut self, days: u32) {
        self.ttl_duration_days = days;
    }

    /// Applies raw keystroke text to the time-to-live field.
    ///
    /// Non-numeric or sub-minimum input is dropped and the previous value is
    /// kept.
    ///
    /// # Returns
    /// `true` when the field changed to the parsed value.
    pub fn set_ttl_input(&mut self, raw: &str) -> bool {
        match raw.trim().parse::<u32>() {
            Ok(days) if days >= MIN_TTL_DAYS => {
                self.ttl_duration_days = days;
                true
            }
            _ => false,
        }
    }

    /// Checks every submit precondition.
    ///
    /// # Errors
    /// Returns the first failing [`FormError`] in field order.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.host_file_ref.is_empty() {
            return Err(FormError::MissingHostFile);
        }
        if self.change_number.is_empty() {
            return Err(FormError::MissingChangeNumber);
        }
        if self.ttl_duration_days < MIN_TTL_DAYS {
            return Err(FormError::InvalidTtl(self.ttl_duration_days));
        }
        Ok(())
    }

    /// Returns `true` iff host file and change number are set and ttl >= 1.
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Submit precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// No host file has been accepted yet.
    #[error("a VM list file is required")]
    MissingHostFile,
    /// Change number is blank.
    #[error("a CHG number is required")]
    MissingChangeNumber,
    /// Time-to-live below one day.
    #[error("snapshot time-to-live must be at least 1 day, got {0}")]
    InvalidTtl(u32),
}

/// Lifecycle phase of one submission controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// Ready to accept a submit action.
    Idle,
    /// A request is in flight.
    Submitting,
    /// The last request returned a well-formed summary.
    Succeeded,
    /// The last request failed.
    Failed,
}

/// Upload progress percentage for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionProgress {
    percent: u8,
}

impl SubmissionProgress {
    /// Progress at the start of a submission.
    pub const ZERO: Self = Self { percent: 0 };

    /// Current percentage in `[0, 100]`.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Folds a transport byte count into the percentage.
    ///
    /// Reports that would lower the value are ignored.
    ///
    /// # Returns
    /// `true` when the stored percentage increased.
    pub fn advance(&mut self, bytes_sent: u64, bytes_total: Option<u64>) -> bool {
        let next = upload_percent(bytes_sent, bytes_total);
        if next > self.percent {
            self.percent = next;
            return true;
        }
        false
    }
}

/// Computes `round(bytes_sent * 100 / bytes_total)` clamped to 100.
///
/// Unknown or zero totals yield 0.
pub fn upload_percent(bytes_sent: u64, bytes_total: Option<u64>) -> u8 {
    let total = match bytes_total {
        Some(total) if total > 0 => u128::from(total),
        _ => return 0,
    };

    // Half-up rounding in integer space.
    let rounded = (u128::from(bytes_sent) * 200 + total) / (total * 2);
    rounded.min(100) as u8
}
