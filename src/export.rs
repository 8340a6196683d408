use std::path::{Path, PathBuf};

use log::{error, info};

use crate::{
    cli::{ExportConfig, RepositoryTarget},
    error::Result,
    files,
    provider::ReleaseSource,
    release::{ArchiveKind, Release},
};

const ARCHIVE_KINDS: [ArchiveKind; 2] = [ArchiveKind::Zip, ArchiveKind::Tarball];

#[derive(Debug, Default, PartialEq)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
    pub archive_failures: usize,
}

/// Writes one JSON file per release, and optionally its source archives.
pub struct Exporter<'a, S> {
    source: &'a S,
    config: &'a ExportConfig,
}

impl<'a, S: ReleaseSource> Exporter<'a, S> {
    pub fn new(source: &'a S, config: &'a ExportConfig) -> Self {
        Exporter { source, config }
    }

    pub async fn run(&self, repository: &RepositoryTarget) -> Result<ExportSummary> {
        info!("Fetching releases from repository: {}", repository);
        let releases = self.source.list_releases(repository).await?;
        info!("{} releases fetched from {}", releases.len(), repository);

        files::ensure_dir(&self.config.output_dir).await?;

        let mut summary = ExportSummary::default();

        for (index, release) in releases.iter().enumerate() {
            let path = self.config.output_dir.join(release_file_name(
                self.config.file_prefix.as_deref(),
                index,
            ));
            files::create_json(release, &path).await?;
            info!("Created file: {}", path.display());
            summary.files.push(path);

            if self.config.archives {
                self.download_archives(release, &repository.name, &mut summary)
                    .await;
            }
        }

        Ok(summary)
    }

    async fn download_archives(
        &self,
        release: &Release,
        repository_name: &str,
        summary: &mut ExportSummary,
    ) {
        let directory: &Path = &self.config.output_dir;

        for kind in ARCHIVE_KINDS {
            match self
                .source
                .download_archive(release, repository_name, kind, directory)
                .await
            {
                Ok(path) => {
                    info!("Downloaded archive: {}", path.display());
                    summary.archives.push(path);
                }
                Err(error) => {
                    error!(
                        "Error downloading {} archive of {}: {}",
                        kind.extension(),
                        release.display_name(),
                        error
                    );
                    summary.archive_failures += 1;
                }
            }
        }
    }
}

/// `release-0.json`, or `<prefix>-release-0.json` with a prefix.
pub fn release_file_name(prefix: Option<&str>, index: usize) -> String {
    match prefix.filter(|prefix| !prefix.is_empty()) {
        Some(prefix) => format!("{prefix}-release-{index}.json"),
        None => format!("release-{index}.json"),
    }
}
