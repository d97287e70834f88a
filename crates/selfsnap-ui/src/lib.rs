#![warn(missing_docs)]
//! # selfsnap-ui
//!
//! ## Purpose
//! Defines the presentation-facing capability used by `selfsnap` workflows.
//!
//! ## Responsibilities
//! - Model notifications (title, text, severity, lifetime).
//! - Declare the [`Notifier`] capability workflows report through.
//! - Build the canonical operator-facing messages.
//! - Project form and submission state into display labels.
//!
//! ## Data flow
//! Workflow transitions build a [`Notification`] with one of the message
//! builders and hand it to an injected [`Notifier`]. Renderers call
//! [`project_form_status`] to draw the current form.
//!
//! ## Ownership and lifetimes
//! Notifications own their strings so a renderer may queue them past the
//! workflow call that produced them.
//!
//! ## Error model
//! Notifying is infallible from the workflow's point of view. A renderer that
//! cannot display a message must swallow the failure.
//!
//! ## Security and privacy notes
//! The device-login user code is the only credential-like value placed in a
//! notification, and only in the persistent login prompt.

use std::time::Duration;

use selfsnap_contract::SnapshotSummary;
use selfsnap_core::{FormError, SubmissionForm, SubmissionPhase, SubmissionProgress};

/// Lifetime of short confirmations such as file acceptance.
pub const TRANSIENT_DISPLAY: Duration = Duration::from_millis(3_000);

/// Lifetime of submission and login-failure outcomes.
pub const LONG_LIVED_DISPLAY: Duration = Duration::from_millis(9_000);

/// Failure text used when the backend supplied no usable reason.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Failure text for device-login initiation.
pub const LOGIN_FAILED_MESSAGE: &str = "Failed to initiate Azure login";

/// Placeholder shown while no host file has been accepted.
pub const HOST_FILE_PLACEHOLDER: &str = "Drag and drop a text file here, or click to select";

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
    /// Instructions for the operator.
    Info,
}

/// How long a notification stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLifetime {
    /// Dismissed automatically after the duration.
    Timed(Duration),
    /// Stays until the operator dismisses it.
    Persistent,
}

/// One structured notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Severity used for styling.
    pub severity: Severity,
    /// Visibility policy.
    pub lifetime: DisplayLifetime,
    /// Whether the operator may close it early.
    pub closable: bool,
}

impl Notification {
    fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        lifetime: DisplayLifetime,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            lifetime,
            closable: true,
        }
    }

    /// Returns `true` when the notification never auto-expires.
    pub fn is_persistent(&self) -> bool {
        self.lifetime == DisplayLifetime::Persistent
    }
}

/// Presentation capability invoked by workflows.
pub trait Notifier: Send + Sync {
    /// Displays one notification.
    fn notify(&self, notification: Notification);
}

/// Confirms an accepted host file.
pub fn file_accepted(name: &str) -> Notification {
    Notification::new(
        "File uploaded",
        format!("{name} has been uploaded successfully."),
        Severity::Success,
        DisplayLifetime::Timed(TRANSIENT_DISPLAY),
    )
}

/// Reports a refused host file.
pub fn file_rejected() -> Notification {
    Notification::new(
        "Invalid file type",
        "Please upload a text file.",
        Severity::Error,
        DisplayLifetime::Timed(TRANSIENT_DISPLAY),
    )
}

/// Reports a submit attempt refused before reaching the network.
pub fn form_incomplete(error: &FormError) -> Notification {
    Notification::new(
        "Incomplete form",
        error.to_string(),
        Severity::Error,
        DisplayLifetime::Timed(TRANSIENT_DISPLAY),
    )
}

/// Shows the device-login user code until dismissed.
pub fn login_code(user_code: &str) -> Notification {
    Notification::new(
        "Azure Login",
        format!("Please use the code {user_code} to log in to Azure."),
        Severity::Info,
        DisplayLifetime::Persistent,
    )
}

/// Reports a failed device-login initiation.
pub fn login_failed() -> Notification {
    Notification::new(
        "Error",
        LOGIN_FAILED_MESSAGE,
        Severity::Error,
        DisplayLifetime::Timed(LONG_LIVED_DISPLAY),
    )
}

/// Summarizes a completed submission.
pub fn snapshots_created(summary: &SnapshotSummary) -> Notification {
    Notification::new(
        "Snapshots created",
        format!(
            "Total VMs: {}, Successful: {}, Failed: {}",
            summary.total_vms, summary.successful_snapshots, summary.failed_snapshots
        ),
        Severity::Success,
        DisplayLifetime::Timed(LONG_LIVED_DISPLAY),
    )
}

/// Reports a failed submission, falling back to [`GENERIC_ERROR_MESSAGE`].
pub fn submission_failed(message: Option<&str>) -> Notification {
    let description = message
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or(GENERIC_ERROR_MESSAGE);

    Notification::new(
        "Error",
        description,
        Severity::Error,
        DisplayLifetime::Timed(LONG_LIVED_DISPLAY),
    )
}

/// Progress label shown while a submission is in flight.
pub fn progress_label(progress: SubmissionProgress) -> String {
    format!("Progress: {}%", progress.percent())
}

/// Display labels for the submission form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStatus {
    /// Accepted file name or the selection placeholder.
    pub host_file_label: String,
    /// Change number as entered.
    pub change_number: String,
    /// Time-to-live label.
    pub ttl_label: String,
    /// Whether the submit control should accept input.
    pub submit_enabled: bool,
    /// Whether the submit control shows a busy indicator.
    pub busy: bool,
    /// Progress label, only present while submitting.
    pub progress_label: Option<String>,
}

/// Projects form and controller state into display labels.
pub fn project_form_status(
    form: &SubmissionForm,
    phase: SubmissionPhase,
    progress: SubmissionProgress,
) -> FormStatus {
    let busy = phase == SubmissionPhase::Submitting;
    let host_file_label = if form.host_file_ref().is_empty() {
        HOST_FILE_PLACEHOLDER.to_string()
    } else {
        form.host_file_ref().to_string()
    };

    FormStatus {
        host_file_label,
        change_number: form.change_number().to_string(),
        ttl_label: format!("{} days", form.ttl_duration_days()),
        submit_enabled: !busy && form.is_submittable(),
        busy,
        progress_label: busy.then(|| progress_label(progress)),
    }
}
