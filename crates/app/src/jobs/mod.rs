pub mod harvest;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("github error: {0}")]
    Github(#[from] harvest_infra::github::GithubError),
    #[error("output error: {0}")]
    Output(#[from] harvest_infra::output::OutputError),
}
