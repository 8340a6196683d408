//! Release migration: list on the source, rewrite, create on the target, relay assets.

use std::collections::HashSet;

use chrono::Utc;
use log::{error, info, warn};

use crate::{
    cli::{RepositorySelection, RepositoryTarget, SyncConfig},
    error::{MigrateError, Result},
    files,
    mapping::{annotate_timestamps, BodyMapper},
    provider::{ReleaseSource, ReleaseTarget},
    release::{Asset, Release},
};

/// Totals across every repository of one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Asset relays that failed. Not folded into `failed`: a release whose
    /// assets did not all transfer still counts as succeeded.
    pub asset_failures: usize,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.total - self.failed
    }

    pub fn absorb(&mut self, other: RunSummary) {
        self.total += other.total;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.asset_failures += other.asset_failures;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Created { asset_failures: usize },
    Skipped,
    Failed,
}

/// Expands the configured repository or repository list into `owner/name` targets.
pub async fn resolve_targets(config: &SyncConfig) -> Result<Vec<RepositoryTarget>> {
    let default_owner = config.source.organization.as_deref();

    let entries = match &config.repositories {
        RepositorySelection::Single(repository) => vec![repository.clone()],
        RepositorySelection::List(path) => files::read_repository_list(path).await?,
    };

    entries
        .iter()
        .map(|entry| RepositoryTarget::resolve(entry, default_owner).map_err(MigrateError::from))
        .collect()
}

pub struct Migrator<'a, S, T> {
    source: &'a S,
    target: &'a T,
    config: &'a SyncConfig,
}

impl<'a, S: ReleaseSource, T: ReleaseTarget> Migrator<'a, S, T> {
    pub fn new(source: &'a S, target: &'a T, config: &'a SyncConfig) -> Self {
        Migrator {
            source,
            target,
            config,
        }
    }

    pub async fn run(&self, repositories: &[RepositoryTarget]) -> RunSummary {
        let mut summary = RunSummary::default();

        for repository in repositories {
            match self.migrate_repository(repository).await {
                Ok(repository_summary) => {
                    if repository_summary.failed > 0 {
                        warn!(
                            "{}: {} of {} releases failed to create",
                            repository, repository_summary.failed, repository_summary.total
                        );
                    } else {
                        info!("{}: all releases created successfully", repository);
                    }
                    summary.absorb(repository_summary);
                }
                Err(error) => error!("Error migrating releases of {}: {}", repository, error),
            }
        }

        summary
    }

    /// Fails only if the release list cannot be fetched.
    pub async fn migrate_repository(&self, repository: &RepositoryTarget) -> Result<RunSummary> {
        info!("Fetching releases from repository: {}", repository);
        let releases = self.source.list_releases(repository).await?;
        info!("{} releases fetched from {}", releases.len(), repository);

        let destination = RepositoryTarget {
            owner: self.config.target_organization.clone(),
            name: repository.name.clone(),
        };
        let mapper = self
            .body_mapper(repository)
            .map_err(|error| warn!("Error loading mapping file, bodies are kept as is: {}", error))
            .ok();

        let mut summary = RunSummary {
            total: releases.len(),
            ..RunSummary::default()
        };
        let mut created_tags = HashSet::new();

        for release in &releases {
            match self
                .migrate_release(release, &destination, mapper.as_ref(), &mut created_tags)
                .await
            {
                ReleaseOutcome::Created { asset_failures } => {
                    summary.asset_failures += asset_failures
                }
                ReleaseOutcome::Skipped => summary.skipped += 1,
                ReleaseOutcome::Failed => summary.failed += 1,
            }
        }

        Ok(summary)
    }

    pub async fn migrate_release(
        &self,
        release: &Release,
        destination: &RepositoryTarget,
        mapper: Option<&BodyMapper>,
        created_tags: &mut HashSet<String>,
    ) -> ReleaseOutcome {
        info!("Creating release: {}", release.display_name());

        let body = release.body.as_deref().unwrap_or("");
        let body = match mapper {
            Some(mapper) => mapper.map_body(body),
            None => body.to_string(),
        };
        let body = annotate_timestamps(release, &body, Utc::now());

        let new_release = match release.to_new_release(body) {
            Some(new_release) => new_release,
            None => {
                warn!(
                    "Error creating release {}: {}",
                    release.display_name(),
                    MigrateError::MissingField("tag_name")
                );
                return ReleaseOutcome::Failed;
            }
        };

        if created_tags.contains(&new_release.tag_name) {
            info!("Release already exists: {}... skipping", release.display_name());
            return ReleaseOutcome::Skipped;
        }

        let created = match self.target.create_release(destination, &new_release).await {
            Ok(created) => created,
            Err(error) if error.is_already_exists() => {
                info!("Release already exists: {}... skipping", release.display_name());
                return ReleaseOutcome::Skipped;
            }
            Err(error) => {
                warn!("Error creating release {}: {}", release.display_name(), error);
                return ReleaseOutcome::Failed;
            }
        };
        created_tags.insert(new_release.tag_name.clone());

        let mut asset_failures = 0;
        for asset in &release.assets {
            if let Err(error) = self.relay_asset(asset, &created).await {
                error!("Error relaying asset {}: {}", asset.name, error);
                asset_failures += 1;
            }
        }

        ReleaseOutcome::Created { asset_failures }
    }

    /// Download, upload, then remove the temporary copy whatever the upload did.
    pub async fn relay_asset(&self, asset: &Asset, created: &Release) -> Result<()> {
        let upload_url = created
            .upload_url
            .as_deref()
            .ok_or(MigrateError::MissingField("upload_url"))?;
        let path = files::temp_path(&self.config.temp_dir, &asset.name);

        info!("Downloading asset... {}", asset.name);
        let downloaded = self.source.download_asset(asset, &path).await;

        let uploaded = match downloaded {
            Ok(()) => {
                info!("Uploading asset... {}", asset.name);
                self.target.upload_asset(upload_url, asset, &path).await
            }
            Err(error) => Err(error),
        };

        let removed = if path.exists() {
            files::remove_file(&path).await
        } else {
            Ok(())
        };

        uploaded.and(removed)
    }

    /// Loads the handle map once per repository.
    fn body_mapper(&self, repository: &RepositoryTarget) -> Result<BodyMapper> {
        BodyMapper::new(&repository.owner, &self.config.target_organization)
            .with_hostnames(
                self.config.source.hostname.as_deref(),
                self.config.target.hostname.as_deref(),
            )
            .with_mapping_file(self.config.mapping_file.as_deref())
    }
}
