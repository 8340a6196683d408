use std::path::PathBuf;
use std::time::Duration;

use super::{
    common::{EndpointConfig, NetworkConfig, RepositorySelection},
    reader::FileConfig,
    ExportArgs, SyncArgs,
};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    pub source: EndpointConfig,
    pub target: EndpointConfig,
    pub target_organization: String,
    pub repositories: RepositorySelection,
    pub mapping_file: Option<PathBuf>,
    pub temp_dir: PathBuf,
    pub network: NetworkConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportConfig {
    pub source: EndpointConfig,
    pub repository: String,
    pub file_prefix: Option<String>,
    pub output_dir: PathBuf,
    pub archives: bool,
    pub network: NetworkConfig,
}

pub fn parse_sync_config(args: &SyncArgs, file: FileConfig) -> Result<SyncConfig, ConfigError> {
    let source_organization = pick(&args.source_organization, file.source_organization);
    let repository = pick(&args.repository, file.repository);
    let repository_list = args.repository_list.clone().or(file.repository_list);

    let repositories = match (repository, repository_list) {
        (Some(_), Some(_)) => return Err(ConfigError::RepositoryAndList),
        (Some(repository), None) => {
            if !repository.contains('/') && source_organization.is_none() {
                return Err(ConfigError::MissingSourceOrganization);
            }
            RepositorySelection::Single(repository)
        }
        (None, Some(list)) => RepositorySelection::List(list),
        (None, None) => return Err(ConfigError::NoRepository),
    };

    let target_organization = pick(&args.target_organization, file.target_organization)
        .ok_or(ConfigError::Missing("target-organization"))?;

    let source = EndpointConfig {
        organization: source_organization,
        token: pick(&args.source_token, file.source_token)
            .ok_or(ConfigError::Missing("source-token"))?,
        hostname: pick(&args.source_hostname, file.source_hostname),
    };

    let target = EndpointConfig {
        organization: Some(target_organization.clone()),
        token: pick(&args.target_token, file.target_token)
            .ok_or(ConfigError::Missing("target-token"))?,
        hostname: pick(&args.target_hostname, file.target_hostname),
    };

    Ok(SyncConfig {
        source,
        target,
        target_organization,
        repositories,
        mapping_file: args.mapping_file.clone().or(file.mapping_file),
        temp_dir: args
            .temp_dir
            .clone()
            .or(file.temp_dir)
            .unwrap_or_else(|| PathBuf::from("tmp")),
        network: network_config(
            args.timeout,
            args.max_rate_limit_wait,
            file.timeout_secs,
            file.max_rate_limit_wait_secs,
        ),
    })
}

pub fn parse_export_config(
    args: &ExportArgs,
    file: FileConfig,
) -> Result<ExportConfig, ConfigError> {
    let organization = pick(&args.organization, file.source_organization);
    let repository =
        pick(&args.repository, file.repository).ok_or(ConfigError::Missing("repository"))?;

    if !repository.contains('/') && organization.is_none() {
        return Err(ConfigError::MissingSourceOrganization);
    }

    Ok(ExportConfig {
        source: EndpointConfig {
            organization,
            token: pick(&args.token, file.source_token).ok_or(ConfigError::Missing("token"))?,
            hostname: pick(&args.hostname, file.source_hostname),
        },
        repository,
        file_prefix: pick(&args.file_prefix, file.output_file),
        output_dir: args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
        archives: args.archives,
        network: network_config(
            args.timeout,
            args.max_rate_limit_wait,
            file.timeout_secs,
            file.max_rate_limit_wait_secs,
        ),
    })
}

/// Flag or environment value first, then the config file. Empty strings count as unset.
fn pick(flag: &Option<String>, file: Option<String>) -> Option<String> {
    flag.clone()
        .filter(|value| !value.is_empty())
        .or(file)
        .filter(|value| !value.is_empty())
}

fn network_config(
    timeout: Option<u64>,
    max_rate_limit_wait: Option<u64>,
    file_timeout: Option<u64>,
    file_max_rate_limit_wait: Option<u64>,
) -> NetworkConfig {
    let defaults = NetworkConfig::default();

    NetworkConfig {
        request_timeout: timeout
            .or(file_timeout)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout),
        max_rate_limit_wait: max_rate_limit_wait
            .or(file_max_rate_limit_wait)
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_rate_limit_wait),
    }
}
