//! Parley terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! parley --name Alice --surname Smith
//! parley --name Alice --surname Smith --directory http://chat:8080 \
//!     --endpoint ws://chat:8080/ws/websocket --log-file parley.log
//! ```

use std::{fs::File, path::PathBuf, time::Duration};

use clap::Parser;
use parley_client::{DirectoryClient, DirectoryConfig};
use parley_tui::{Runtime, SessionConfig, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "One-to-one chat in the terminal")]
#[command(version)]
struct Args {
    /// Given name to sign in as
    #[arg(long)]
    name: String,

    /// Family name to sign in as
    #[arg(long)]
    surname: String,

    /// Directory service base URL
    #[arg(long, default_value = "http://localhost:8080")]
    directory: String,

    /// Real-time channel endpoint
    #[arg(long, default_value = parley_app::DEFAULT_CHANNEL_ENDPOINT)]
    endpoint: String,

    /// Directory request timeout in seconds
    #[arg(long, default_value = "10")]
    request_timeout: u64,

    /// Write logs to this file. The terminal is taken by the UI, so nothing
    /// is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        let file = File::create(path)?;
        tracing_subscriber::registry().with(fmt::layer().with_writer(file).with_ansi(false)).with(filter).init();
    }

    let directory = DirectoryClient::new(&DirectoryConfig {
        base_url: args.directory,
        request_timeout: Duration::from_secs(args.request_timeout),
    })?;
    let config = SessionConfig { channel_endpoint: args.endpoint };

    let mut runtime = Runtime::new(TerminalDriver::new(directory)?, config);

    match runtime.bootstrap(&args.name, &args.surname).await {
        Ok(handle) => {
            tracing::info!(assigned_id = handle.assigned_id, "session ready");
            runtime.run().await?;
            Ok(())
        },
        Err(error) => {
            tracing::warn!(%error, "bootstrap failed");
            // Keep the failure on screen until the user leaves.
            if runtime.session().connect_error().is_some() {
                runtime.run().await?;
            }
            Err(error.into())
        },
    }
}
