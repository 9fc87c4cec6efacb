use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

use harvest_core::domain::Discussion;

pub const RUN_LOG_FILE: &str = "run.log";
pub const AGGREGATE_FILE: &str = "all_discussions_llm_ready.md";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One timestamped directory holding every file a run produces.
#[derive(Debug, Clone)]
pub struct RunDir {
    path: PathBuf,
}

impl RunDir {
    pub fn create(parent: &Path, started_at: NaiveDateTime) -> Result<Self, OutputError> {
        let path = parent.join(started_at.format("%Y%m%d_%H%M%S").to_string());
        fs::create_dir_all(&path).map_err(|source| OutputError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_path(&self) -> PathBuf {
        self.path.join(RUN_LOG_FILE)
    }

    pub fn raw_path(&self, number: i32) -> PathBuf {
        self.path.join(format!("discussion_{number}.json"))
    }

    pub fn document_path(&self, number: i32) -> PathBuf {
        self.path.join(format!("discussion_{number}.md"))
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.path.join(AGGREGATE_FILE)
    }

    pub fn write_raw(&self, discussion: &Discussion) -> Result<PathBuf, OutputError> {
        let json = serde_json::to_string_pretty(discussion)?;
        let path = self.raw_path(discussion.number);
        write_file(&path, json.as_bytes())?;
        Ok(path)
    }

    pub fn write_document(&self, number: i32, document: &str) -> Result<PathBuf, OutputError> {
        let path = self.document_path(number);
        write_file(&path, document.as_bytes())?;
        Ok(path)
    }

    pub fn write_aggregate(&self, document: &str) -> Result<PathBuf, OutputError> {
        let path = self.aggregate_path();
        write_file(&path, document.as_bytes())?;
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
