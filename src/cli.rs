use crate::clock::SystemClock;
use crate::config::{self, FirebaseWebConfig, StoreOverrides};
use crate::error::{SubmitError, GENERIC_ERROR_MESSAGE};
use crate::model::{DocumentRef, RegistrationRecord, SubmitReceipt};
use crate::orchestrator::FormController;
use crate::store::{DocumentStore, FirestoreStore, MemoryStore};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

/// Where a line of user-facing output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Writes receipts and banners from a blocking task so the runtime never
/// waits on a slow terminal or pipe.
struct OutputWriter {
    tx: mpsc::UnboundedSender<OutputLine>,
    task: tokio::task::JoinHandle<()>,
}

impl OutputWriter {
    fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
        let task = tokio::task::spawn_blocking(move || {
            let mut out = std::io::LineWriter::new(std::io::stdout().lock());
            let mut err = std::io::LineWriter::new(std::io::stderr().lock());
            while let Some(line) = rx.blocking_recv() {
                let written = match &line {
                    OutputLine::Stdout(msg) => writeln!(out, "{msg}"),
                    OutputLine::Stderr(msg) => writeln!(err, "{msg}"),
                };
                // Reader went away (closed pipe); nothing left to report to.
                if written.is_err() {
                    break;
                }
            }
            let _ = out.flush();
            let _ = err.flush();
        });
        Self { tx, task }
    }

    fn send(&self, line: OutputLine) {
        let _ = self.tx.send(line);
    }

    /// Flush everything queued so far and stop the writer.
    async fn finish(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}

/// A failed `--submit` whose receipt and error line are already on screen.
/// `main` turns this into exit code 1 without printing it again.
#[derive(Debug, thiserror::Error)]
#[error("registration was not stored")]
pub struct AlreadyReported;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "team-register",
    version,
    about = "Event team registration form backed by Cloud Firestore"
)]
pub struct Cli {
    /// Firebase web app config (JSON with apiKey, projectId, ...)
    #[arg(long, env = "TEAM_REGISTER_FIREBASE_CONFIG")]
    pub firebase_config: Option<PathBuf>,

    /// Firebase API key (overrides the config file)
    #[arg(long, env = "TEAM_REGISTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Firestore project id (overrides the config file)
    #[arg(long, env = "TEAM_REGISTER_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Firestore database id
    #[arg(long)]
    pub database: Option<String>,

    /// Base URL of the Firestore REST API (point at an emulator for testing)
    #[arg(long, default_value = "https://firestore.googleapis.com")]
    pub base_url: String,

    /// Timeout for the document write
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Event name shown in the form header
    #[arg(long, default_value = "Spectra 2025")]
    pub event_name: String,

    /// Payment reference shown for online payments (QR image URL, UPI id, ...)
    #[arg(
        long,
        default_value = "https://via.placeholder.com/150x150.png?text=Quantum+QR"
    )]
    pub payment_reference: String,

    /// Submit a registration from a JSON file ('-' for stdin) and exit (no TUI)
    #[arg(long, value_name = "PATH")]
    pub submit: Option<String>,

    /// Validate and print the document instead of writing it to Firestore
    #[arg(long)]
    pub dry_run: bool,

    /// Run silently: suppress all output except errors (with --submit)
    #[arg(long)]
    pub silent: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.silent && args.submit.is_none() {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --submit. Use --silent --submit <PATH> together."
        ));
    }

    if let Some(source) = args.submit.clone() {
        return run_submit(&args, &source).await;
    }

    run_interactive(args).await
}

#[cfg(feature = "tui")]
async fn run_interactive(args: Cli) -> Result<()> {
    crate::tui::run(args).await
}

#[cfg(not(feature = "tui"))]
async fn run_interactive(_args: Cli) -> Result<()> {
    // Fallback when built without TUI support.
    Err(anyhow::anyhow!(
        "built without TUI support; use --submit <PATH> to register non-interactively"
    ))
}

/// Build the store the form writes to.
pub fn build_store(args: &Cli) -> Result<Arc<dyn DocumentStore>> {
    if args.dry_run {
        tracing::info!("dry run: registrations are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let file = match args.firebase_config.as_deref() {
        Some(path) => config::load_web_config(path)?,
        None => FirebaseWebConfig::default(),
    };
    let overrides = StoreOverrides {
        api_key: args.api_key.clone(),
        project_id: args.project_id.clone(),
        database: args.database.clone(),
        timeout: args.timeout.as_deref().copied(),
    };
    let cfg = config::resolve(
        file,
        overrides,
        &args.base_url,
        format!("team-register/{}", env!("CARGO_PKG_VERSION")),
    )?;
    tracing::info!(project = %cfg.project_id, database = %cfg.database, "using firestore");
    Ok(Arc::new(FirestoreStore::new(cfg)?))
}

async fn read_record(source: &str) -> Result<RegistrationRecord> {
    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("read registration from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("read registration from {source}"))?
    };
    serde_json::from_str(&raw).context("parse registration JSON")
}

fn receipt_for(form: &FormController, result: &Result<DocumentRef, SubmitError>) -> SubmitReceipt {
    match result {
        Ok(doc) => SubmitReceipt {
            status: form.status(),
            document: Some(doc.clone()),
            stored: form.last_stored().cloned(),
            error: None,
        },
        Err(_) => SubmitReceipt {
            status: form.status(),
            document: None,
            stored: None,
            error: Some(form.error_message().to_string()),
        },
    }
}

/// JSON receipt on stdout, one human-readable line on stderr.
fn report_lines(receipt: &SubmitReceipt) -> Result<Vec<OutputLine>> {
    let banner = match (&receipt.document, &receipt.error) {
        (Some(doc), _) => format!("Registry Confirmed: Access Granted! (document {})", doc.id()),
        (None, err) => format!(
            "Error: {}",
            err.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE)
        ),
    };
    Ok(vec![
        OutputLine::Stdout(serde_json::to_string_pretty(receipt)?),
        OutputLine::Stderr(banner),
    ])
}

/// Non-interactive submission: one record in, one JSON receipt out.
async fn run_submit(args: &Cli, source: &str) -> Result<()> {
    let record = read_record(source).await?;
    let store = build_store(args)?;
    let mut form = FormController::new(store, Arc::new(SystemClock)).with_record(record);

    let writer = (!args.silent).then(OutputWriter::spawn);
    if let Some(w) = writer.as_ref() {
        w.send(OutputLine::Stderr("Transmitting...".into()));
    }

    let result = form.submit().await;
    let receipt = receipt_for(&form, &result);

    match writer {
        Some(w) => {
            for line in report_lines(&receipt)? {
                w.send(line);
            }
            w.finish().await;
            match result {
                Ok(_) => Ok(()),
                Err(_) => Err(AlreadyReported.into()),
            }
        }
        // Silent: only the error message, printed once by the caller.
        None => result
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e.display_message())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::SubmitStatus;
    use crate::validate::filled_record;
    use time::macros::datetime;

    fn form_with(record: RegistrationRecord) -> FormController {
        let clock = Arc::new(FixedClock(datetime!(2025-02-01 10:00:00 UTC)));
        FormController::new(Arc::new(MemoryStore::new()), clock).with_record(record)
    }

    fn error_lines(lines: &[OutputLine]) -> Vec<&str> {
        lines
            .iter()
            .filter_map(|l| match l {
                OutputLine::Stderr(m) if m.starts_with("Error:") => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn failed_submit_prints_a_single_error_line() {
        let mut form = form_with(RegistrationRecord {
            team_name: "x".into(),
            email: "bad".into(),
            ..Default::default()
        });
        let result = form.submit().await;
        let lines = report_lines(&receipt_for(&form, &result)).unwrap();

        assert_eq!(
            error_lines(&lines),
            vec!["Error: Missing required fields: name1, name2, department, phone1, phone2"]
        );
        let OutputLine::Stdout(json) = &lines[0] else {
            panic!("receipt should go to stdout first");
        };
        let receipt: SubmitReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.status, SubmitStatus::Error);
        assert!(receipt.document.is_none());
    }

    #[tokio::test]
    async fn receipt_carries_the_stored_document() {
        let mut form = form_with(filled_record());
        let result = form.submit().await;
        let receipt = receipt_for(&form, &result);

        assert_eq!(receipt.status, SubmitStatus::Success);
        let stored = receipt.stored.as_ref().unwrap();
        assert_eq!(stored.record, filled_record());
        assert_eq!(stored.timestamp, "2025-02-01T10:00:00.000Z");

        let lines = report_lines(&receipt).unwrap();
        assert!(error_lines(&lines).is_empty());
        assert_eq!(
            lines[1],
            OutputLine::Stderr("Registry Confirmed: Access Granted! (document 000001)".into())
        );
    }

    #[tokio::test]
    async fn reported_failure_is_not_printed_again() {
        let path = std::env::temp_dir().join(format!(
            "team-register-{}-incomplete.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"teamName":"x","email":"bad"}"#).unwrap();
        let source = path.to_string_lossy().into_owned();

        let loud = Cli::parse_from(["team-register", "--dry-run", "--submit", &source]);
        let err = run_submit(&loud, &source).await.unwrap_err();
        assert!(err.downcast_ref::<AlreadyReported>().is_some());

        let silent =
            Cli::parse_from(["team-register", "--dry-run", "--silent", "--submit", &source]);
        let err = run_submit(&silent, &source).await.unwrap_err();
        assert!(err.downcast_ref::<AlreadyReported>().is_none());
        assert!(err.to_string().starts_with("Missing required fields"));

        let _ = std::fs::remove_file(&path);
    }
}
