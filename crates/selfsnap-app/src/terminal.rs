//! Terminal rendering of notifications and progress.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use selfsnap_core::{SubmissionPhase, SubmissionProgress};
use selfsnap_submit::SubmissionObserver;
use selfsnap_ui::{Notification, Notifier, Severity, progress_label};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Renders one notification as a single terminal line.
pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification.severity {
        Severity::Success => "ok",
        Severity::Error => "error",
        Severity::Info => "info",
    };

    let mut line = format!(
        "[{marker}] {}: {}",
        notification.title, notification.description
    );
    if notification.is_persistent() {
        line.push_str(" (press Enter to dismiss)");
    }
    line
}

/// Notifier writing to stderr.
///
/// Timed notifications scroll away with the terminal. Persistent ones are
/// remembered until [`TerminalNotifier::wait_for_dismissal`] consumes them.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    persistent_pending: AtomicBool,
}

impl TerminalNotifier {
    /// Creates a notifier with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a persistent notification awaits dismissal.
    pub fn has_pending_dismissal(&self) -> bool {
        self.persistent_pending.load(Ordering::SeqCst)
    }

    /// Blocks the calling task until the operator presses Enter, if a
    /// persistent notification is showing.
    ///
    /// # Errors
    /// Propagates stdin read failures.
    pub async fn wait_for_dismissal(&self) -> std::io::Result<()> {
        if !self.persistent_pending.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        Ok(())
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        if notification.is_persistent() {
            self.persistent_pending.store(true, Ordering::SeqCst);
        }
        eprintln!("{}", render_notification(&notification));
    }
}

/// Progress line renderer for the submission controller.
#[derive(Debug, Default)]
pub struct TerminalProgress {
    line_open: AtomicBool,
}

impl SubmissionObserver for TerminalProgress {
    fn on_phase(&self, phase: SubmissionPhase) {
        if phase != SubmissionPhase::Submitting && self.line_open.swap(false, Ordering::SeqCst) {
            eprintln!();
        }
    }

    fn on_progress(&self, progress: SubmissionProgress) {
        self.line_open.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", progress_label(progress));
        let _ = stderr.flush();
    }
}
