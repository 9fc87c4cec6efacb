use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cli::Cli;
use harvest_core::CoreError;
use harvest_core::types::{RepoId, Since};
use harvest_infra::github::{GRAPHQL_ENDPOINT, MAX_PAGE_SIZE, RetryPolicy};

const MAX_REQUEST_TIMEOUT_SECS: u64 = 3_600;
const MAX_RETRY_DELAY_MS: u64 = 3_600_000;

#[derive(Clone)]
pub struct AppConfig {
    pub repo: RepoId,
    pub output_dir: PathBuf,
    pub token: String,
    pub since: Option<Since>,
    pub only_contributors: bool,
    pub write_documents: bool,
    pub write_aggregate: bool,
    pub graphql_url: String,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub retry: RetryPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("github token missing: pass --token or set GITHUB_TOKEN")]
    MissingToken,
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl AppConfig {
    pub fn from_env(cli: Cli, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        Self::from_lookup(cli, now, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(cli: Cli, now: DateTime<Utc>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let repo = RepoId::try_from(cli.repository.as_str())?;
        let since = cli
            .since
            .as_deref()
            .map(|raw| Since::parse(raw, now))
            .transpose()?;
        let token = cli
            .token
            .and_then(non_blank)
            .or_else(|| env.optional_string("GITHUB_TOKEN"))
            .ok_or(ConfigError::MissingToken)?;

        let graphql_url = env.string("HARVEST_GRAPHQL_URL", GRAPHQL_ENDPOINT);
        if !graphql_url.starts_with("http://") && !graphql_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue("HARVEST_GRAPHQL_URL", graphql_url));
        }
        let request_timeout_secs =
            env.bounded_u64("HARVEST_REQUEST_TIMEOUT_SECS", 30, MAX_REQUEST_TIMEOUT_SECS)?;
        let page_size = env.u64("HARVEST_PAGE_SIZE", 30)?;
        let max_retries = env.u64("HARVEST_MAX_RETRIES", 3)?;
        let retry_base_ms =
            env.bounded_u64("HARVEST_RETRY_BASE_DELAY_MS", 1_000, MAX_RETRY_DELAY_MS)?;
        let retry_max_ms =
            env.bounded_u64("HARVEST_RETRY_MAX_DELAY_MS", 30_000, MAX_RETRY_DELAY_MS)?;

        let write_documents = !cli.no_llm_ready;
        Ok(Self {
            repo,
            output_dir: cli.output_dir,
            token,
            since,
            only_contributors: cli.only_contributors,
            write_documents,
            write_aggregate: write_documents && !cli.no_aggregate,
            graphql_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            page_size: page_size.clamp(1, u64::from(MAX_PAGE_SIZE)) as u32,
            retry: RetryPolicy {
                max_retries: u32::try_from(max_retries).map_err(|_| {
                    ConfigError::InvalidNumber("HARVEST_MAX_RETRIES", max_retries.to_string())
                })?,
                initial_delay: Duration::from_millis(retry_base_ms),
                max_delay: Duration::from_millis(retry_max_ms.max(retry_base_ms)),
                ..RetryPolicy::default()
            },
        })
    }
}

/// Loads `.env` from the working directory without overriding variables already set.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, key: &'static str, default: &'static str) -> String {
        self.optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn optional_string(&self, key: &'static str) -> Option<String> {
        (self.lookup)(key).and_then(non_blank)
    }

    fn u64(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        match self.optional_string(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber(key, raw)),
            None => Ok(default),
        }
    }

    fn bounded_u64(&self, key: &'static str, default: u64, max: u64) -> Result<u64, ConfigError> {
        let value = self.u64(key, default)?;
        if value > max {
            return Err(ConfigError::InvalidValue(key, format!("{value} exceeds {max}")));
        }
        Ok(value)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
