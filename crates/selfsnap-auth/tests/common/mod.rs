//! Shared fakes for device-login integration tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use selfsnap_auth::{BrowserLauncher, LaunchError, LoginTransport};
use selfsnap_contract::{HttpReply, TransportFailure};
use selfsnap_ui::{Notification, Notifier};

/// Transport that replays one canned result and counts calls.
pub struct CannedLoginTransport {
    reply: Result<HttpReply, TransportFailure>,
    pub calls: AtomicUsize,
}

impl CannedLoginTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(HttpReply::new(status, body.as_bytes().to_vec())),
            calls: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(TransportFailure(reason.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoginTransport for CannedLoginTransport {
    async fn request_device_login(&self) -> Result<HttpReply, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// Launcher that records opened URLs, optionally failing.
#[derive(Default)]
pub struct RecordingLauncher {
    pub opened: Mutex<Vec<String>>,
    pub fail: bool,
}

impl BrowserLauncher for RecordingLauncher {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        self.opened
            .lock()
            .expect("launcher lock should work")
            .push(url.to_string());
        if self.fail {
            return Err(LaunchError("no browser available".to_string()));
        }
        Ok(())
    }
}

/// Notifier that keeps every notification in order.
#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
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
