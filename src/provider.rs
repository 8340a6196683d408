use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    cli::RepositoryTarget,
    error::Result,
    release::{ArchiveKind, Asset, NewRelease, Release},
};

/// Where releases are read from.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Every release of the repository, all pages, or an error if any page fails.
    async fn list_releases(&self, repository: &RepositoryTarget) -> Result<Vec<Release>>;

    async fn download_asset(&self, asset: &Asset, destination: &Path) -> Result<()>;

    /// Downloads into `directory` and returns the written file.
    async fn download_archive(
        &self,
        release: &Release,
        repository_name: &str,
        kind: ArchiveKind,
        directory: &Path,
    ) -> Result<PathBuf>;
}

/// Where releases are recreated.
#[async_trait]
pub trait ReleaseTarget: Send + Sync {
    /// Fails with `MigrateError::AlreadyExists` when the tag is taken.
    async fn create_release(
        &self,
        repository: &RepositoryTarget,
        release: &NewRelease,
    ) -> Result<Release>;

    async fn upload_asset(&self, upload_url: &str, asset: &Asset, file: &Path) -> Result<()>;
}

#[async_trait]
pub trait IssueReporter: Send + Sync {
    async fn comment_on_issue(
        &self,
        repository: &RepositoryTarget,
        issue_number: u64,
        body: &str,
    ) -> Result<()>;
}
