use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static VERSION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d.*)$").expect("version tag pattern is valid"));

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    pub node_id: Option<String>,
    pub tag_name: Option<String>,
    pub target_commitish: Option<String>,
    pub name: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
    pub upload_url: Option<String>,
    pub zipball_url: Option<String>,
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Every other field of the payload, written back untouched on export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub label: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub browser_download_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the create-release request sent to the target.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tarball,
}

impl ArchiveKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Tarball => "tar.gz",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArchiveKind::Zip => "application/zip",
            ArchiveKind::Tarball => "application/x-gzip",
        }
    }
}

impl Release {
    /// Name used in logs and skip messages: the release name, else its tag, else its id.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.tag_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    pub fn archive_url(&self, kind: ArchiveKind) -> Option<&str> {
        match kind {
            ArchiveKind::Zip => self.zipball_url.as_deref(),
            ArchiveKind::Tarball => self.tarball_url.as_deref(),
        }
    }

    pub fn to_new_release(&self, body: String) -> Option<NewRelease> {
        let tag_name = self.tag_name.clone()?;

        Some(NewRelease {
            tag_name,
            target_commitish: self.target_commitish.clone(),
            name: self.name.clone(),
            body,
            draft: self.draft,
            prerelease: self.prerelease,
        })
    }
}

/// `v1.2.0` becomes `1.2.0`; tags that do not start with `v` and a digit are kept.
pub fn normalize_tag(tag: &str) -> &str {
    match VERSION_TAG.captures(tag).and_then(|captures| captures.get(1)) {
        Some(version) => version.as_str(),
        None => tag,
    }
}

pub fn archive_file_name(repository: &str, tag: &str, kind: ArchiveKind) -> String {
    format!(
        "{repository}-{version}.{extension}",
        repository = repository,
        version = normalize_tag(tag),
        extension = kind.extension()
    )
}
