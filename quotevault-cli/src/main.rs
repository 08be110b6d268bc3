//! QuoteVault CLI — run the quote snapshot job once.
//!
//! With no flags this behaves like a cron entry: fetch one quote, archive it,
//! log the outcome, exit 0.
//!
//! # Environment Variables
//!
//! - `FINNHUB_API_KEY`: quote API token
//! - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` (or any AWS credential source)
//! - `QUOTE_SYMBOL`, `QUOTE_FILE_LABEL`, `QUOTE_SCRATCH_DIR`
//! - `S3_BUCKET_NAME`, `S3_KEY_PREFIX`, `S3_REGION`
//! - `RUST_LOG`: log filter (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use quotevault_core::{run_job, FinnhubClient, JobConfig, LocalStore, ObjectStore, S3Store};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quotevault",
    about = "QuoteVault — archive a point-in-time stock quote to object storage"
)]
struct Cli {
    /// TOML config file; environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write into this directory (`<dir>/<bucket>/<key>`) instead of S3.
    #[arg(long)]
    local_store: Option<PathBuf>,

    /// Exit with status 1 when the job fails.
    #[arg(long, default_value_t = false)]
    fail_exit_code: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    load_dotenv_from_ancestors();
    init_logging()?;

    tracing::info!("Executing stock data fetch job...");

    let succeeded = run(&cli);
    Ok(exit_code(succeeded, cli.fail_exit_code))
}

/// Build the job's collaborators and run it once. Setup failures are
/// reported the same way as stage failures.
fn run(cli: &Cli) -> bool {
    match prepare(cli) {
        Ok(job) => run_job(&job.config, &job.source, job.store.as_ref()).is_success(),
        Err(e) => {
            tracing::error!("Job failed: {e:#}");
            false
        }
    }
}

struct Job {
    config: JobConfig,
    source: FinnhubClient,
    store: Box<dyn ObjectStore>,
}

fn prepare(cli: &Cli) -> Result<Job> {
    let config = JobConfig::from_env(cli.config.as_deref())?;
    log_config(&config);

    let source = FinnhubClient::with_default_client(
        config.api_url.clone(),
        config.api_key.as_ref().map(|k| k.expose().to_string()),
    )
    .context("failed to build quote client")?;

    let store: Box<dyn ObjectStore> = match &cli.local_store {
        Some(dir) => Box::new(LocalStore::new(dir)),
        None => Box::new(
            S3Store::connect(&config.destination.region)
                .context("failed to build S3 client")?,
        ),
    };

    Ok(Job {
        config,
        source,
        store,
    })
}

/// Exit 0 regardless of outcome unless `--fail-exit-code` was given.
fn exit_code(succeeded: bool, fail_exit_code: bool) -> ExitCode {
    if fail_exit_code && !succeeded {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

fn log_config(config: &JobConfig) {
    tracing::debug!(
        symbol = %config.symbol,
        api_url = %config.api_url,
        api_key_set = config.api_key.is_some(),
        bucket = %config.destination.bucket,
        prefix = %config.destination.prefix,
        region = %config.destination.region,
        scratch_dir = %config.scratch_dir.display(),
        "configuration loaded"
    );
}

/// Load `.env` from the working directory or the nearest ancestor that has one.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("quotevault").chain(args.iter().copied()))
    }

    #[test]
    fn unparseable_config_fails_setup_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotevault.toml");
        std::fs::write(&path, "[quote\nsymbol = ").unwrap();
        let store_dir = dir.path().join("store");

        let cli = cli(&[
            "--config",
            path.to_str().unwrap(),
            "--local-store",
            store_dir.to_str().unwrap(),
        ]);
        assert!(prepare(&cli).is_err());
        assert!(!run(&cli));
        assert!(!store_dir.exists());
    }

    #[test]
    fn exit_code_only_fails_when_asked() {
        assert_eq!(
            format!("{:?}", exit_code(false, false)),
            format!("{:?}", ExitCode::SUCCESS)
        );
        assert_eq!(
            format!("{:?}", exit_code(true, true)),
            format!("{:?}", ExitCode::SUCCESS)
        );
        assert_eq!(
            format!("{:?}", exit_code(false, true)),
            format!("{:?}", ExitCode::FAILURE)
        );
    }
}
