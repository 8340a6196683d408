use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

pub const PUBLIC_HOSTNAME: &str = "github.com";
const PUBLIC_API_URL: &str = "https://api.github.com";

static REPOSITORY_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("repository pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct RepositoryTarget {
    pub owner: String,
    pub name: String,
}

impl RepositoryTarget {
    /// `owner/name` keeps its own owner, a bare `name` falls back to `default_owner`.
    pub fn resolve(value: &str, default_owner: Option<&str>) -> Result<Self, ConfigError> {
        let value = value.trim().trim_end_matches('/');
        let value = value.strip_suffix(".git").unwrap_or(value);

        let (owner, name) = match value.split_once('/') {
            Some((owner, name)) => (owner.to_string(), name.to_string()),
            None => match default_owner.filter(|owner| !owner.is_empty()) {
                Some(owner) => (owner.to_string(), value.to_string()),
                None => return Err(ConfigError::MissingSourceOrganization),
            },
        };

        if !REPOSITORY_PART.is_match(&owner) || !REPOSITORY_PART.is_match(&name) {
            return Err(ConfigError::InvalidRepository(value.to_string()));
        }

        Ok(RepositoryTarget { owner, name })
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RepositorySelection {
    Single(String),
    List(PathBuf),
}

/// One side of the migration: which instance, which organization, which token.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointConfig {
    pub organization: Option<String>,
    pub token: String,
    pub hostname: Option<String>,
}

impl EndpointConfig {
    pub fn api_url(&self) -> String {
        match self.host() {
            Some(host) => format!("https://{host}/api/v3"),
            None => PUBLIC_API_URL.to_string(),
        }
    }

    /// Hostname without scheme or trailing slash, `None` for github.com.
    pub fn host(&self) -> Option<&str> {
        self.hostname.as_deref().map(bare_host).filter(|host| !host.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    pub request_timeout: Duration,
    /// Longest rate limit reset we are willing to sleep through.
    pub max_rate_limit_wait: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            request_timeout: Duration::from_secs(300),
            max_rate_limit_wait: Duration::from_secs(3600),
        }
    }
}

pub fn bare_host(hostname: &str) -> &str {
    let hostname = hostname.trim();
    let hostname = hostname
        .strip_prefix("https://")
        .or_else(|| hostname.strip_prefix("http://"))
        .unwrap_or(hostname);

    hostname.trim_end_matches('/')
}
