#![warn(missing_docs)]
//! # selfsnap-submit
//!
//! ## Purpose
//! Drives one snapshot submission from form snapshot to operator feedback.
//!
//! ## Responsibilities
//! - Refuse unsubmittable forms before any network call.
//! - Ignore submit actions while a submission is in flight.
//! - Relay transport byte counts into monotonic progress.
//! - Reconcile the reply into a summary or a failure and notify the operator.
//!
//! ## Data flow
//! [`SubmissionController::submit`] snapshots the form into a
//! [`CreateSnapshotsRequest`] -> [`SubmitTransport`] posts it while reporting
//! progress -> the [`HttpReply`] becomes a [`SubmitOutcome`] -> [`Notifier`]
//! shows the result -> controller returns to idle.
//!
//! ## State machine
//! `Idle -> Submitting -> {Succeeded | Failed} -> Idle`. The return to idle
//! happens in a drop guard, so it also runs when the transport future panics
//! or the submit future is dropped mid-flight.
//!
//! ## Concurrency
//! The controller lives on one cooperative timeline. Its state sits in
//! [`Cell`]s, which makes it `!Sync` and keeps every access on that timeline.
//! Submit futures may be polled concurrently on one task (for example with
//! `join!`); the in-flight flag turns all but the first into no-ops.
//!
//! ## Error model
//! Failures are values: [`SubmitOutcome::Failed`] carries a [`SubmitError`]
//! and [`classify_failure`] maps it onto the validation/transport/server
//! taxonomy. No failure is retried.

use std::cell::Cell;
use std::sync::Arc;

use async_trait::async_trait;
use selfsnap_contract::{
    CreateSnapshotsRequest, HttpReply, SnapshotSummary, TransportFailure, extract_error_message,
    parse_snapshot_summary, request_fingerprint,
};
use selfsnap_core::{FormError, SubmissionForm, SubmissionPhase, SubmissionProgress};
use selfsnap_ui::{Notifier, form_incomplete, snapshots_created, submission_failed};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Receives upload byte counts while a request body is being sent.
pub trait ProgressSink {
    /// Reports cumulative bytes sent, with the body size when known.
    fn report(&self, bytes_sent: u64, bytes_total: Option<u64>);
}

/// Abstract transport for the snapshot creation endpoint.
///
/// Futures are not required to be `Send`: progress is relayed into the
/// caller's single-threaded state.
#[async_trait(?Send)]
pub trait SubmitTransport {
    /// Issues one `POST /api/create-snapshots` request.
    ///
    /// Implementations report progress in non-decreasing byte order and
    /// return any HTTP reply, successful or not.
    async fn post_snapshots(
        &self,
        request: &CreateSnapshotsRequest,
        progress: &dyn ProgressSink,
    ) -> Result<HttpReply, TransportFailure>;
}

/// Observes controller state for rendering.
pub trait SubmissionObserver {
    /// Called on every phase change.
    fn on_phase(&self, _phase: SubmissionPhase) {}

    /// Called on reset and whenever progress increases.
    fn on_progress(&self, _progress: SubmissionProgress) {}
}

/// Result of one submit action.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Backend created snapshots and returned a summary.
    Succeeded(SnapshotSummary),
    /// Request failed; the operator has been notified.
    Failed(SubmitError),
    /// Form failed a precondition; no request was made.
    Rejected(FormError),
    /// A submission was already in flight; nothing happened.
    Ignored,
}

impl SubmitOutcome {
    /// Failure category, if the outcome is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SubmitOutcome::Failed(error) => Some(classify_failure(error)),
            SubmitOutcome::Rejected(_) => Some(FailureKind::Validation),
            SubmitOutcome::Succeeded(_) | SubmitOutcome::Ignored => None,
        }
    }
}

/// Submission failures after the request was attempted.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// No HTTP reply was obtained.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Backend answered with a non-2xx status.
    #[error("backend returned status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// `error` field of the body, when present.
        message: Option<String>,
    },
    /// 2xx reply whose body is not a valid summary.
    #[error("malformed snapshot summary: {reason}")]
    MalformedResponse {
        /// Parser diagnostic.
        reason: String,
        /// `error` field of the body, when present.
        message: Option<String>,
    },
}

impl SubmitError {
    /// Backend-supplied reason suitable for the operator.
    pub fn operator_message(&self) -> Option<&str> {
        match self {
            SubmitError::Transport(_) => None,
            SubmitError::Server { message, .. } | SubmitError::MalformedResponse { message, .. } => {
                message.as_deref()
            }
        }
    }
}

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Recovered locally; never reached the network.
    Validation,
    /// Network unreachable or reply unusable.
    Transport,
    /// Backend reported an error status.
    Server,
}

/// Maps a submission failure onto the failure taxonomy.
pub fn classify_failure(error: &SubmitError) -> FailureKind {
    match error {
        SubmitError::Transport(_) | SubmitError::MalformedResponse { .. } => FailureKind::Transport,
        SubmitError::Server { .. } => FailureKind::Server,
    }
}

/// Submission state machine.
pub struct SubmissionController {
    transport: Arc<dyn SubmitTransport>,
    notifier: Arc<dyn Notifier>,
    observer: Option<Arc<dyn SubmissionObserver>>,
    phase: Cell<SubmissionPhase>,
    progress: Cell<SubmissionProgress>,
    in_flight: Cell<bool>,
}

impl SubmissionController {
    /// Creates an idle controller.
    pub fn new(transport: Arc<dyn SubmitTransport>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            transport,
            notifier,
            observer: None,
            phase: Cell::new(SubmissionPhase::Idle),
            progress: Cell::new(SubmissionProgress::ZERO),
            in_flight: Cell::new(false),
        }
    }

    /// Attaches a state observer.
    pub fn with_observer(mut self, observer: Arc<dyn SubmissionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current phase.
    pub fn phase(&self) -> SubmissionPhase {
        self.phase.get()
    }

    /// Progress of the current or last submission.
    pub fn progress(&self) -> SubmissionProgress {
        self.progress.get()
    }

    /// Returns `true` while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    /// Submits a snapshot of `form`.
    ///
    /// Re-checks the form even when the caller already gated on it. A call
    /// made while another submission is in flight returns
    /// [`SubmitOutcome::Ignored`] without side effects.
    pub async fn submit(&self, form: &SubmissionForm) -> SubmitOutcome {
        if self.in_flight.get() {
            debug!("submit ignored while a submission is in flight");
            return SubmitOutcome::Ignored;
        }

        if let Err(error) = form.validate() {
            info!(%error, "submit refused");
            self.notifier.notify(form_incomplete(&error));
            return SubmitOutcome::Rejected(error);
        }

        let request = CreateSnapshotsRequest::from_form(form);
        let fingerprint = request_fingerprint(&request);
        let _guard = self.enter();

        info!(
            %fingerprint,
            host_file = %request.host_file,
            chg_number = %request.chg_number,
            ttl_duration = request.ttl_duration,
            "submitting snapshot request"
        );

        match self.exchange(&request).await {
            Ok(summary) => {
                if !summary.is_consistent() {
                    warn!(
                        %fingerprint,
                        total_vms = summary.total_vms,
                        successful = summary.successful_snapshots,
                        failed = summary.failed_snapshots,
                        "snapshot counters do not add up"
                    );
                }
                self.set_phase(SubmissionPhase::Succeeded);
                info!(
                    %fingerprint,
                    total_vms = summary.total_vms,
                    successful = summary.successful_snapshots,
                    failed = summary.failed_snapshots,
                    "snapshot request completed"
                );
                self.notifier.notify(snapshots_created(&summary));
                SubmitOutcome::Succeeded(summary)
            }
            Err(error) => {
                self.set_phase(SubmissionPhase::Failed);
                warn!(%fingerprint, %error, kind = ?classify_failure(&error), "snapshot request failed");
                self.notifier
                    .notify(submission_failed(error.operator_message()));
                SubmitOutcome::Failed(error)
            }
        }
    }

    async fn exchange(&self, request: &CreateSnapshotsRequest) -> Result<SnapshotSummary, SubmitError> {
        let relay = ProgressRelay { controller: self };
        let reply = self
            .transport
            .post_snapshots(request, &relay)
            .await
            .map_err(|failure| SubmitError::Transport(failure.0))?;

        if !reply.is_success() {
            return Err(SubmitError::Server {
                status: reply.status,
                message: extract_error_message(&reply.body),
            });
        }

        parse_snapshot_summary(&reply.body).map_err(|error| SubmitError::MalformedResponse {
            reason: error.to_string(),
            message: extract_error_message(&reply.body),
        })
    }

    fn enter(&self) -> InFlightGuard<'_> {
        self.in_flight.set(true);
        self.progress.set(SubmissionProgress::ZERO);
        self.notify_progress();
        self.set_phase(SubmissionPhase::Submitting);
        InFlightGuard { controller: self }
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        self.phase.set(phase);
        if let Some(observer) = &self.observer {
            observer.on_phase(phase);
        }
    }

    fn notify_progress(&self) {
        if let Some(observer) = &self.observer {
            observer.on_progress(self.progress.get());
        }
    }
}

/// Returns the controller to idle on every exit from `Submitting`.
struct InFlightGuard<'a> {
    controller: &'a SubmissionController,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.controller.in_flight.set(false);
        self.controller.set_phase(SubmissionPhase::Idle);
    }
}

struct ProgressRelay<'a> {
    controller: &'a SubmissionController,
}

impl ProgressSink for ProgressRelay<'_> {
    fn report(&self, bytes_sent: u64, bytes_total: Option<u64>) {
        let controller = self.controller;
        if !controller.in_flight.get() {
            return;
        }

        let mut progress = controller.progress.get();
        if progress.advance(bytes_sent, bytes_total) {
            controller.progress.set(progress);
            controller.notify_progress();
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for failure classification.

    use super::*;

    #[test]
    fn malformed_bodies_count_as_transport_failures() {
        let error = SubmitError::MalformedResponse {
            reason: "eof".to_string(),
            message: None,
        };
        assert_eq!(classify_failure(&error), FailureKind::Transport);
        assert_eq!(
            classify_failure(&SubmitError::Server {
                status: 502,
                message: None
            }),
            FailureKind::Server
        );
    }

    #[test]
    fn transport_failures_carry_no_operator_message() {
        assert_eq!(
            SubmitError::Transport("refused".to_string()).operator_message(),
            None
        );
    }
}
