//! Shared fakes for submission controller tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use selfsnap_contract::{CreateSnapshotsRequest, HttpReply, TransportFailure};
use selfsnap_core::{SubmissionForm, SubmissionPhase, SubmissionProgress};
use selfsnap_submit::{ProgressSink, SubmissionObserver, SubmitTransport};
use selfsnap_ui::{Notification, Notifier};
use tokio::sync::Notify;

pub const SUMMARY_BODY: &str =
    r#"{"total_vms":10,"successful_snapshots":8,"failed_snapshots":2}"#;

/// Behaviour of one scripted transport call.
pub enum Script {
    Reply(u16, String),
    Fail(String),
    Panic,
}

/// Transport that plays a script, reporting progress before answering.
pub struct ScriptedTransport {
    script: Script,
    progress: Vec<(u64, Option<u64>)>,
    gate: Option<Notify>,
    calls: AtomicUsize,
    pub requests: Mutex<Vec<CreateSnapshotsRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            progress: Vec::new(),
            gate: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Script::Reply(200, SUMMARY_BODY.to_string()))
    }

    pub fn with_progress(mut self, reports: &[(u64, Option<u64>)]) -> Self {
        self.progress = reports.to_vec();
        self
    }

    /// Holds every call until [`ScriptedTransport::release`] is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait(?Send)]
impl SubmitTransport for ScriptedTransport {
    async fn post_snapshots(
        &self,
        request: &CreateSnapshotsRequest,
        progress: &dyn ProgressSink,
    ) -> Result<HttpReply, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());

        for (sent, total) in &self.progress {
            progress.report(*sent, *total);
        }

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.script {
            Script::Reply(status, body) => Ok(HttpReply::new(*status, body.as_bytes().to_vec())),
            Script::Fail(reason) => Err(TransportFailure(reason.clone())),
            Script::Panic => panic!("transport exploded"),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifier lock should work").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .expect("notifier lock should work")
            .push(notification);
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub phases: Mutex<Vec<SubmissionPhase>>,
    pub progress: Mutex<Vec<u8>>,
}

impl RecordingObserver {
    pub fn phases(&self) -> Vec<SubmissionPhase> {
        self.phases.lock().expect("observer lock should work").clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.progress.lock().expect("observer lock should work").clone()
    }
}

impl SubmissionObserver for RecordingObserver {
    fn on_phase(&self, phase: SubmissionPhase) {
        self.phases
            .lock()
            .expect("observer lock should work")
            .push(phase);
    }

    fn on_progress(&self, progress: SubmissionProgress) {
        self.progress
            .lock()
            .expect("observer lock should work")
            .push(progress.percent());
    }
}

/// Form that passes every submit precondition.
pub fn ready_form() -> SubmissionForm {
    let mut form = SubmissionForm::new();
    form.set_host_file_ref("prod_vms.txt");
    form.set_change_number("CHG0031337");
    form.set_ttl_duration_days(5);
    form
}
