use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crpt_client::api::CrptApi;
use crpt_client::config::CrptConfig;

#[derive(Parser)]
#[command(name = "crpt-client")]
#[command(about = "Submit signed documents to the CRPT API under a client-side rate limit")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a JSON document
    Submit {
        /// Path to the JSON document
        #[arg(short, long)]
        document: PathBuf,

        /// Detached signature of the document
        #[arg(short, long)]
        signature: String,

        /// Submit the document this many times concurrently
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Bearer token, overrides the configuration file
        #[arg(long, env = "CRPT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => CrptConfig::from_file(path)?,
        None => CrptConfig::default(),
    };
    info!(
        endpoint = %config.api.endpoint,
        unit = ?config.rate_limit.unit,
        requests_per_unit = config.rate_limit.requests_per_unit,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Submit {
            document,
            signature,
            repeat,
            token,
        } => {
            if token.is_some() {
                config.api.token = token;
            }
            submit(&config, document, signature, repeat).await
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn submit(
    config: &CrptConfig,
    document: PathBuf,
    signature: String,
    repeat: usize,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&document)
        .with_context(|| format!("Failed to read document {}", document.display()))?;
    let document: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Document {} is not valid JSON", document.display()))?;

    let api = Arc::new(CrptApi::from_config(config)?);
    let document = Arc::new(document);
    let signature = Arc::new(signature);

    // Flipped once on Ctrl+C or SIGTERM; every waiting submission observes it.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let handles: Vec<_> = (0..repeat)
        .map(|attempt| {
            let api = Arc::clone(&api);
            let document = Arc::clone(&document);
            let signature = Arc::clone(&signature);
            let shutdown = shutdown_rx.clone();

            tokio::spawn(async move {
                let result = api
                    .create_document_until(document.as_ref(), &signature, shutdown_requested(shutdown))
                    .await;
                (attempt, result)
            })
        })
        .collect();

    let mut failures = 0usize;
    for handle in handles {
        let (attempt, result) = handle.await?;
        match result {
            Ok(()) => info!(attempt = attempt, "Submission succeeded"),
            Err(e) => {
                failures += 1;
                error!(attempt = attempt, error = %e, "Submission failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} submissions failed", failures, repeat);
    }
    info!(submissions = repeat, "All submissions completed");
    Ok(())
}

/// Resolve once shutdown has been requested.
///
/// A closed channel means the signal task is gone without a signal, so this
/// never resolves in that case.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    let signalled = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !signalled {
        std::future::pending::<()>().await;
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, interrupting pending submissions");
        }
        _ = terminate => {
            info!("Received SIGTERM, interrupting pending submissions");
        }
    }
}
