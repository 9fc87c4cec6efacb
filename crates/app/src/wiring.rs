use reqwest::Client;
use thiserror::Error;

use crate::config::AppConfig;
use harvest_infra::github::GithubClient;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub fn build_client(config: &AppConfig) -> Result<GithubClient, WiringError> {
    let http = Client::builder().timeout(config.request_timeout).build()?;
    Ok(GithubClient::new(http, config.token.clone())
        .with_endpoint(config.graphql_url.clone())
        .with_retry(config.retry.clone()))
}
