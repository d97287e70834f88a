//! Shared fakes for app integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use selfsnap_app::{AppConfig, HttpBackend};
use selfsnap_submit::ProgressSink;
use selfsnap_ui::{Notification, Notifier};

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
pub struct RecordingProgress {
    reports: Mutex<Vec<(u64, Option<u64>)>>,
}

impl RecordingProgress {
    pub fn reports(&self) -> Vec<(u64, Option<u64>)> {
        self.reports.lock().expect("progress lock should work").clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, bytes_sent: u64, bytes_total: Option<u64>) {
        self.reports
            .lock()
            .expect("progress lock should work")
            .push((bytes_sent, bytes_total));
    }
}

/// Backend pointed at a mock server base URL.
pub fn backend_for(base_url: &str) -> HttpBackend {
    let config = AppConfig::from_base_url(base_url).expect("mock url should be valid");
    HttpBackend::new(config).expect("http client should build")
}
