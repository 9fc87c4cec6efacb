use std::path::PathBuf;

use clap::Parser;

/// Fetch GitHub Discussions into JSON records and LLM-ready documents.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Repository URL (https://github.com/owner/repo) or owner/repo.
    #[arg(short, long)]
    pub repository: String,
    /// Parent directory for the timestamped run directory.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
    /// GitHub token; falls back to GITHUB_TOKEN.
    #[arg(short, long)]
    pub token: Option<String>,
    /// Only discussions updated since YYYY-MM-DD or a relative offset (7d, 2w, 1m, "3 days ago").
    #[arg(long)]
    pub since: Option<String>,
    /// Only discussions where a commit author posted, commented or replied.
    #[arg(long, default_value_t = false)]
    pub only_contributors: bool,
    /// Skip the per-discussion and aggregate documents.
    #[arg(long, default_value_t = false)]
    pub no_llm_ready: bool,
    /// Skip only the aggregate document.
    #[arg(long, default_value_t = false)]
    pub no_aggregate: bool,
}
