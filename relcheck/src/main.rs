//! relcheck - Entry Point
//!
//! Deploys a CI-built release into an ephemeral environment, tests it and
//! tears it down, or waits for a deployed service to report a new version.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use relcheck::app::credentials::token_from_env;
use relcheck::app::options::{ArtifactSource, DeployOptions, DownloadOptions, WaitOptions, DEFAULT_REGION};
use relcheck::app::run::{download, Verifier};
use relcheck::deploy::runner::CommandRunner;
use relcheck::errors::VerifyError;
use relcheck::http::client::HttpClient;
use relcheck::logs::{init_logging, LogLevel, LogOptions};
use relcheck::service::client::ServiceClient;
use relcheck::service::monitor::wait_for_version_change;
use relcheck::settings::Settings;
use relcheck::utils::version_info;

#[derive(Parser)]
#[command(name = "relcheck")]
#[command(about = "Verify CI-built releases in a throwaway environment")]
#[command(version)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "RELCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the latest release artifact of a branch, test it, then delete it
    Deploy {
        branch: String,

        /// Instance name, also used as the resource group
        instance: String,

        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        /// Keep the environment after the run
        #[arg(long)]
        skip_cleanup: bool,

        /// Also write logs to this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Download the latest release artifact of a branch
    Download { branch: String, filename: PathBuf },

    /// Wait until a deployed service reports a different version
    WaitForVersion {
        /// Service base URL (defaults to the settings file)
        #[arg(long)]
        endpoint: Option<String>,

        /// Component whose version is compared
        #[arg(long)]
        component: Option<String>,

        #[arg(long)]
        interval_secs: Option<u64>,

        /// Give up after this long (waits forever when unset)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).await?;

    let log_dir = match &cli.command {
        Commands::Deploy { log_dir, .. } => log_dir.clone(),
        _ => None,
    };
    let log_options = LogOptions {
        log_level: cli.log_level.unwrap_or(settings.log_level),
        json_format: cli.json_logs,
        log_dir,
    };
    let _log_guard = init_logging(&log_options)?;

    let version = version_info();
    info!("relcheck {} ({}, built {})", version.version, version.git_hash, version.build_time);

    match cli.command {
        Commands::Deploy {
            branch,
            instance,
            region,
            skip_cleanup,
            ..
        } => {
            let ci = Arc::new(github_client(&settings)?);
            let options = DeployOptions::new(&settings, &branch, &instance, &region, skip_cleanup);

            let workdir = tempfile::Builder::new().prefix("relcheck-").tempdir()?;
            let runner = Arc::new(CommandRunner::new(workdir.path()));
            let verifier = Verifier::new(&settings, ci, runner)?;
            verifier
                .run(&options, workdir.path(), await_shutdown_signal())
                .await?;
        }
        Commands::Download { branch, filename } => {
            let ci = Arc::new(github_client(&settings)?);
            let options = DownloadOptions {
                source: ArtifactSource::new(&settings.github, branch),
                destination: filename,
            };
            download(&settings, ci, &options).await?;
        }
        Commands::WaitForVersion {
            endpoint,
            component,
            interval_secs,
            timeout_secs,
        } => {
            let options = WaitOptions::new(&settings.service, endpoint, component, interval_secs, timeout_secs)
                .ok_or_else(|| {
                    VerifyError::ConfigError(
                        "no service endpoint: pass --endpoint or set service.endpoint".to_string(),
                    )
                })?;
            let service = ServiceClient::new(&options.endpoint)?;
            let version =
                wait_for_version_change(&service, &options.component, &options.policy, tokio::time::sleep)
                    .await?;
            println!("{}", serde_json::to_string_pretty(&version)?);
        }
    }

    Ok(())
}

/// The credential is checked before anything else touches the network
fn github_client(settings: &Settings) -> Result<HttpClient, VerifyError> {
    let token = token_from_env(&settings.github.token_env)?;
    HttpClient::new(&settings.github.api_base_url, token)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("SIGTERM received, shutting down..."),
                    _ = sigint.recv() => info!("SIGINT received, shutting down..."),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Unable to install signal handlers, falling back to Ctrl+C: {}", e);
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, shutting down..."),
        Err(e) => {
            warn!("Unable to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
