use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Optional YAML config file. Every key mirrors a flag; flags and environment win.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source_organization: Option<String>,
    pub target_organization: Option<String>,
    pub source_token: Option<String>,
    pub target_token: Option<String>,
    pub source_hostname: Option<String>,
    pub target_hostname: Option<String>,
    pub repository: Option<String>,
    pub repository_list: Option<PathBuf>,
    pub mapping_file: Option<PathBuf>,
    pub output_file: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub max_rate_limit_wait_secs: Option<u64>,
}

pub fn read_config(config: &str) -> Result<FileConfig, serde_yaml::Error> {
    serde_yaml::from_str(config)
}

pub fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|error| ConfigError::File {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    read_config(&content).map_err(|error| ConfigError::File {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}
