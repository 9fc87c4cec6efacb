mod cli;
mod config;
mod jobs;
mod wiring;

use std::fs::File;
use std::sync::Mutex;

use chrono::{Local, Utc};
use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::Cli;
use crate::config::{AppConfig, ConfigError};
use crate::jobs::JobError;
use crate::jobs::harvest::HarvestOptions;
use crate::wiring::WiringError;
use harvest_infra::output::{OutputError, RunDir};

const RUN_LOG_FILTER: &str = "info,harvest_core=debug,harvest_infra=debug,discussion_harvest=debug";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("job error: {0}")]
    Jobs(#[from] JobError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = AppConfig::from_env(cli, Utc::now())?;
    let run_dir = RunDir::create(&config.output_dir, Local::now().naive_local())?;
    init_tracing(&run_dir)?;

    info!(
        repo = %config.repo,
        run_dir = %run_dir.path().display(),
        since = ?config.since.map(|since| since.threshold()),
        only_contributors = config.only_contributors,
        "harvest starting"
    );
    let client = wiring::build_client(&config)?;
    let options = HarvestOptions::from_config(&config);
    jobs::harvest::run(&client, &config.repo, &options, &run_dir)
        .await
        .inspect_err(|err| error!(error = %err, "harvest aborted"))?;
    Ok(())
}

fn init_tracing(run_dir: &RunDir) -> Result<(), std::io::Error> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_file = File::create(run_dir.log_path())?;
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(EnvFilter::new(RUN_LOG_FILTER)),
        )
        .init();
    Ok(())
}
