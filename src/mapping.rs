//! Release body rewriting.
//!
//! All replacements are plain substring replacements applied in a fixed order:
//! hostname, organization, then user handles in the order they appear in the
//! mapping file. A handle that is a substring of another word is replaced too,
//! and a later mapping sees the output of earlier ones.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::cli::common::{bare_host, PUBLIC_HOSTNAME};
use crate::error::{MigrateError, Result};
use crate::release::Release;

const TIMESTAMP_FORMAT: &str = "%B %-d, %Y at %H:%M:%S UTC";

/// Source handle to target handle, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandleMap {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl HandleMap {
    /// A repeated source handle keeps its first position and takes the last value.
    pub fn insert(&mut self, source: String, target: String) {
        match self.positions.get(&source) {
            Some(&position) => self.entries[position].1 = target,
            None => {
                self.positions.insert(source.clone(), self.entries.len());
                self.entries.push((source, target));
            }
        }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.positions
            .get(source)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }

    /// Two columns, no header row.
    pub fn from_csv_reader<R: std::io::Read>(reader: R, path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);

        let mut handles = HandleMap::default();
        for record in reader.records() {
            let record = record?;
            match (record.get(0), record.get(1)) {
                (Some(source), Some(target)) => {
                    handles.insert(source.to_string(), target.to_string())
                }
                _ => {
                    return Err(MigrateError::MalformedMapping {
                        path: path.to_path_buf(),
                        line: record.position().map(|position| position.line()).unwrap_or(0),
                    })
                }
            }
        }

        Ok(handles)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|error| MigrateError::io(path, error))?;

        Self::from_csv_reader(file, path)
    }
}

/// Rewrites release bodies for one source repository.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyMapper {
    pub source_hostname: Option<String>,
    pub target_hostname: String,
    pub source_organization: String,
    pub target_organization: String,
    pub handles: HandleMap,
}

impl BodyMapper {
    pub fn new(source_organization: &str, target_organization: &str) -> Self {
        BodyMapper {
            source_hostname: None,
            target_hostname: PUBLIC_HOSTNAME.to_string(),
            source_organization: source_organization.to_string(),
            target_organization: target_organization.to_string(),
            handles: HandleMap::default(),
        }
    }

    pub fn with_hostnames(mut self, source: Option<&str>, target: Option<&str>) -> Self {
        self.source_hostname = source
            .map(bare_host)
            .filter(|host| !host.is_empty())
            .map(str::to_string);
        if let Some(target) = target.map(bare_host).filter(|host| !host.is_empty()) {
            self.target_hostname = target.to_string();
        }
        self
    }

    /// Loads the handle map once. A mapper that fails to load must not be used.
    pub fn with_mapping_file(mut self, mapping_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = mapping_file {
            self.handles = HandleMap::load(path)?;
        }
        Ok(self)
    }

    pub fn map_body(&self, body: &str) -> String {
        let mut updated = body.to_string();

        if let Some(hostname) = &self.source_hostname {
            updated = updated.replace(hostname.as_str(), &self.target_hostname);
        }

        if !self.source_organization.is_empty() {
            updated = updated.replace(&self.source_organization, &self.target_organization);
        }

        replace_handles(&updated, &self.handles)
    }
}

pub fn replace_handles(body: &str, handles: &HandleMap) -> String {
    handles
        .iter()
        .filter(|(source, _)| !source.is_empty())
        .fold(body.to_string(), |body, (source, target)| {
            body.replace(source, target)
        })
}

/// Appends the source timestamps; a missing one is replaced by `now`.
pub fn annotate_timestamps(release: &Release, body: &str, now: DateTime<Utc>) -> String {
    let created_at = release.created_at.unwrap_or(now).format(TIMESTAMP_FORMAT);
    let published_at = release.published_at.unwrap_or(now).format(TIMESTAMP_FORMAT);

    format!(
        "{body}\n\n>Release Originally Created on: {created_at}\n> Release Originally Published on: {published_at}"
    )
}
