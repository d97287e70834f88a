//! System browser launcher.

use selfsnap_auth::{BrowserLauncher, LaunchError};
use tracing::debug;

/// Opens URLs with the platform's default handler, detached from this
/// process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        debug!(url, "opening browser");
        open::that_detached(url).map_err(|error| LaunchError(error.to_string()))
    }
}
