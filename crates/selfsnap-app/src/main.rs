#![warn(missing_docs)]
//! # selfsnap binary
//!
//! Terminal front end for the snapshot service: device login and snapshot
//! submission.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use selfsnap_app::{
    AppConfig, HttpBackend, SystemBrowser, TerminalNotifier, TerminalProgress,
    apply_file_selection, app_version, describe_local_file, init_tracing, redact_sensitive,
};
use selfsnap_auth::DeviceLoginFlow;
use selfsnap_core::{DEFAULT_TTL_DAYS, SubmissionForm, SubmissionPhase, SubmissionProgress};
use selfsnap_submit::{SubmissionController, SubmitOutcome};
use selfsnap_ui::project_form_status;
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "selfsnap", about = "Create self-destruct VM snapshots")]
struct Cli {
    /// Snapshot service base URL (overrides SELFSNAP_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an Azure device-code login on the snapshot service
    Login,
    /// Submit a VM list for snapshotting
    Submit {
        /// Plain-text file listing the VMs
        #[arg(long)]
        file: PathBuf,
        /// Change ticket authorising the snapshots
        #[arg(long = "chg")]
        change_number: String,
        /// Snapshot time-to-live in days
        #[arg(long, default_value_t = DEFAULT_TTL_DAYS)]
        ttl: u32,
        /// Declared media type, overriding the extension-based guess
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print the version
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("selfsnap {}", app_version());
            Ok(ExitCode::SUCCESS)
        }
        Command::Login => {
            let (backend, notifier) = connect(cli.base_url.as_deref())?;
            let flow = DeviceLoginFlow::new(backend, Arc::new(SystemBrowser), notifier.clone());
            match flow.begin_login().await {
                Ok(_) => {
                    notifier
                        .wait_for_dismissal()
                        .await
                        .context("failed to read from terminal")?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    error!(error = %redact_sensitive(&err.to_string()), "login not started");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Submit {
            file,
            change_number,
            ttl,
            mime,
        } => {
            let (backend, notifier) = connect(cli.base_url.as_deref())?;
            let descriptor = describe_local_file(&file, mime.as_deref())?;

            let mut form = SubmissionForm::new();
            match apply_file_selection(std::slice::from_ref(&descriptor), &mut form, notifier.as_ref()) {
                Some(Ok(_)) => {}
                _ => return Ok(ExitCode::FAILURE),
            }
            form.set_change_number(change_number);
            form.set_ttl_duration_days(ttl);

            let status = project_form_status(&form, SubmissionPhase::Idle, SubmissionProgress::ZERO);
            eprintln!(
                "VM list: {} | CHG: {} | TTL: {}",
                status.host_file_label, status.change_number, status.ttl_label
            );

            let controller = SubmissionController::new(backend, notifier)
                .with_observer(Arc::new(TerminalProgress::default()));
            match controller.submit(&form).await {
                SubmitOutcome::Succeeded(summary) => {
                    print_json(&summary)?;
                    Ok(ExitCode::SUCCESS)
                }
                SubmitOutcome::Failed(_) | SubmitOutcome::Rejected(_) | SubmitOutcome::Ignored => {
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn connect(base_url: Option<&str>) -> anyhow::Result<(Arc<HttpBackend>, Arc<TerminalNotifier>)> {
    let config = AppConfig::resolve(base_url).context("failed to resolve snapshot service url")?;
    info!(version = app_version(), base_url = %config.base_url, "starting");

    let backend = HttpBackend::new(config).context("failed to create HTTP client")?;
    Ok((Arc::new(backend), Arc::new(TerminalNotifier::new())))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize summary")?;
    println!("{out}");
    Ok(())
}
