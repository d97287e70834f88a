//! reqwest transport for the snapshot service.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use selfsnap_auth::LoginTransport;
use selfsnap_contract::{
    CREATE_SNAPSHOTS_PATH, CreateSnapshotsRequest, HttpReply, LOGIN_PATH, TransportFailure,
};
use selfsnap_submit::{ProgressSink, SubmitTransport};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::{AppConfig, AppError};

/// Size of the body slices handed to the connection.
pub const UPLOAD_CHUNK_BYTES: usize = 16 * 1024;

type ProgressReport = (u64, Option<u64>);

/// HTTP client bound to one snapshot service.
///
/// Requests carry no client-side timeout.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: AppConfig,
}

impl HttpBackend {
    /// Creates a backend client.
    ///
    /// # Errors
    /// Returns [`AppError::HttpClient`] when the TLS/client stack cannot be
    /// initialised.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("selfsnap/", env!("SELFSNAP_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportFailure> {
        self.config
            .endpoint(path)
            .map_err(|error| TransportFailure(format!("invalid endpoint {path}: {error}")))
    }
}

#[async_trait]
impl LoginTransport for HttpBackend {
    async fn request_device_login(&self) -> Result<HttpReply, TransportFailure> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!(%url, "requesting device login");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| TransportFailure(format!("login request failed: {error}")))?;

        read_reply(response).await
    }
}

#[async_trait(?Send)]
impl SubmitTransport for HttpBackend {
    async fn post_snapshots(
        &self,
        request: &CreateSnapshotsRequest,
        progress: &dyn ProgressSink,
    ) -> Result<HttpReply, TransportFailure> {
        let url = self.endpoint(CREATE_SNAPSHOTS_PATH)?;
        let payload = request
            .to_json_bytes()
            .map_err(|error| TransportFailure(error.to_string()))?;
        let total = payload.len() as u64;
        debug!(%url, bytes = total, "posting snapshot request");

        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<ProgressReport>();
        progress.report(0, Some(total));

        let send = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, total)
            .body(progress_body(payload, report_tx))
            .send();
        let mut send = std::pin::pin!(send);

        // Reports are applied here, on the caller's task, in arrival order.
        let result = loop {
            tokio::select! {
                biased;
                Some((sent, total)) = report_rx.recv() => progress.report(sent, total),
                result = &mut send => break result,
            }
        };
        while let Ok((sent, total)) = report_rx.try_recv() {
            progress.report(sent, total);
        }

        let response = result
            .map_err(|error| TransportFailure(format!("snapshot request failed: {error}")))?;
        read_reply(response).await
    }
}

/// Wraps a payload in a streamed body that reports cumulative bytes as each
/// slice is pulled by the connection.
fn progress_body(payload: Vec<u8>, reports: mpsc::UnboundedSender<ProgressReport>) -> reqwest::Body {
    let total = payload.len() as u64;
    let payload = Bytes::from(payload);
    let chunks: Vec<Bytes> = (0..payload.len())
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| payload.slice(start..(start + UPLOAD_CHUNK_BYTES).min(payload.len())))
        .collect();

    let mut sent = 0_u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        let _ = reports.send((sent, Some(total)));
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    reqwest::Body::wrap_stream(stream)
}

async fn read_reply(response: reqwest::Response) -> Result<HttpReply, TransportFailure> {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|error| TransportFailure(format!("failed to read response body: {error}")))?;

    debug!(status, bytes = body.len(), "received reply");
    Ok(HttpReply::new(status, body.to_vec()))
}
