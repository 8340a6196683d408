//! Error types shared by the migration and export pipelines.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request failed with status code {status}, message: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("release already exists: {name}")]
    AlreadyExists { name: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit resets in {wait:?}, longer than the allowed {max_wait:?}")]
    RateLimited { wait: Duration, max_wait: Duration },

    #[error("gave up after {attempts} rate limit waits")]
    RateLimitRetriesExhausted { attempts: u32 },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected content type for {url}: expected {expected}, got {actual}")]
    UnexpectedContentType {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed mapping in {path} on line {line}: expected `source,target`")]
    MalformedMapping { path: PathBuf, line: u64 },

    #[error("release is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MigrateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, MigrateError::AlreadyExists { .. })
    }
}

/// Problems with the flags, environment or config file. These abort the run.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("cannot specify both a repository and a repository list")]
    RepositoryAndList,

    #[error("source organization is required when specifying a repository")]
    MissingSourceOrganization,

    #[error("no repository or repository list specified")]
    NoRepository,

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid repository `{0}`, expected `name` or `owner/name`")]
    InvalidRepository(String),

    #[error("could not read config file {path}: {reason}")]
    File { path: PathBuf, reason: String },
}
