mod cli;
mod clock;
mod config;
mod error;
mod logging;
mod model;
mod orchestrator;
mod schema;
mod store;
#[cfg(feature = "tui")]
mod tui;
mod validate;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_silent = args.silent;
    let is_non_tui = args.submit.is_some();

    // Logging is best effort; a missing data dir must not block registration.
    let log_guard = logging::init().ok();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "team-register starting");

    match cli::run(args).await {
        Ok(()) => {
            if is_non_tui {
                drop(log_guard);
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "exiting with error");
            if e.downcast_ref::<cli::AlreadyReported>().is_some() {
                drop(log_guard);
                std::process::exit(1);
            }
            if is_silent {
                drop(log_guard);
                println!("{}", e);
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
