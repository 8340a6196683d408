use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use octocrab::{Octocrab, Page};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::{
    cli::{EndpointConfig, NetworkConfig, RepositoryTarget},
    error::{MigrateError, Result},
    files,
    provider::{IssueReporter, ReleaseSource, ReleaseTarget},
    rate_limit::RateLimiter,
    release::{archive_file_name, ArchiveKind, Asset, NewRelease, Release},
};

const USER_AGENT: &str = concat!("migrate-releases/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: u8 = 100;

static CRYPTO_PROVIDER: OnceLock<()> = OnceLock::new();

#[derive(Serialize)]
struct ListParams {
    per_page: u8,
    page: u32,
}

/// GitHub REST client for one instance and token. Used as source, target and issue reporter.
#[derive(Clone)]
pub struct GithubProvider {
    octocrab: Octocrab,
    http: reqwest::Client,
    token: String,
    limiter: RateLimiter,
}

impl GithubProvider {
    pub fn from_endpoint(endpoint: &EndpointConfig, network: &NetworkConfig) -> Result<Self> {
        Self::configure(&endpoint.token, &endpoint.api_url(), network)
    }

    pub fn configure(token: &str, base_url: &str, network: &NetworkConfig) -> Result<Self> {
        // octocrab and reqwest may pull in different rustls backends; pin one per process.
        CRYPTO_PROVIDER.get_or_init(|| {
            let _ = rustls::crypto::ring::default_provider().install_default();
        });

        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(base_url)?
            .build()?;

        // Transfers can run far past the request timeout; only a stalled connection fails them.
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(network.request_timeout)
            .read_timeout(network.request_timeout)
            .build()?;

        Ok(GithubProvider {
            octocrab,
            http,
            token: token.to_string(),
            limiter: RateLimiter::new(network),
        })
    }

    async fn write_body(response: Response, path: &Path) -> Result<()> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|error| MigrateError::io(path, error))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?)
                .await
                .map_err(|error| MigrateError::io(path, error))?;
        }

        file.flush()
            .await
            .map_err(|error| MigrateError::io(path, error))
    }
}

#[async_trait]
impl ReleaseSource for GithubProvider {
    async fn list_releases(&self, repository: &RepositoryTarget) -> Result<Vec<Release>> {
        let route = format!(
            "/repos/{owner}/{repo}/releases",
            owner = repository.owner,
            repo = repository.name
        );
        let params = ListParams {
            per_page: PER_PAGE,
            page: 1,
        };

        let octocrab = &self.octocrab;
        let (route, params) = (route.as_str(), &params);

        let first = self
            .limiter
            .run(octocrab, move || {
                octocrab.get::<Page<Release>, _, _>(route, Some(params))
            })
            .await
            .map_err(|error| not_found(error, repository))?;

        let mut releases = first.items;
        let mut next = first.next;

        while next.is_some() {
            let current = &next;
            let page = self
                .limiter
                .run(octocrab, move || octocrab.get_page::<Release>(current))
                .await?;

            match page {
                Some(page) => {
                    releases.extend(page.items);
                    next = page.next;
                }
                None => break,
            }
        }

        debug!("Fetched {} releases from {}", releases.len(), repository);

        Ok(releases)
    }

    async fn download_asset(&self, asset: &Asset, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            files::ensure_dir(parent).await?;
        }

        let response = self
            .http
            .get(&asset.browser_download_url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }

        Self::write_body(response, destination).await
    }

    async fn download_archive(
        &self,
        release: &Release,
        repository_name: &str,
        kind: ArchiveKind,
        directory: &Path,
    ) -> Result<PathBuf> {
        let tag = release
            .tag_name
            .as_deref()
            .ok_or(MigrateError::MissingField("tag_name"))?;
        let url = release.archive_url(kind).ok_or(match kind {
            ArchiveKind::Zip => MigrateError::MissingField("zipball_url"),
            ArchiveKind::Tarball => MigrateError::MissingField("tarball_url"),
        })?;

        files::ensure_dir(directory).await?;
        let path = directory.join(archive_file_name(repository_name, tag, kind));

        let response = self.http.get(url).bearer_auth(&self.token).send().await?;

        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();

        if content_type != kind.content_type() {
            return Err(MigrateError::UnexpectedContentType {
                url: url.to_string(),
                expected: kind.content_type().to_string(),
                actual: content_type,
            });
        }

        if let Err(error) = Self::write_body(response, &path).await {
            if let Err(remove_error) = files::remove_file(&path).await {
                warn!("Could not remove partial archive: {}", remove_error);
            }
            return Err(error);
        }

        Ok(path)
    }
}

#[async_trait]
impl ReleaseTarget for GithubProvider {
    async fn create_release(
        &self,
        repository: &RepositoryTarget,
        release: &NewRelease,
    ) -> Result<Release> {
        let route = format!(
            "/repos/{owner}/{repo}/releases",
            owner = repository.owner,
            repo = repository.name
        );

        let octocrab = &self.octocrab;
        let route = route.as_str();

        let result = self
            .limiter
            .run(octocrab, move || {
                octocrab.post::<_, Release>(route, Some(release))
            })
            .await;

        match result {
            Err(MigrateError::Api(error)) if is_already_exists(&error) => {
                Err(MigrateError::AlreadyExists {
                    name: release.name.clone().unwrap_or_else(|| release.tag_name.clone()),
                })
            }
            Err(error) => Err(not_found(error, repository)),
            Ok(created) => Ok(created),
        }
    }

    async fn upload_asset(&self, upload_url: &str, asset: &Asset, file: &Path) -> Result<()> {
        let url = upload_endpoint(upload_url, asset)?;

        let handle = files::open_file(file).await?;
        let size = handle
            .metadata()
            .await
            .map_err(|error| MigrateError::io(file, error))?
            .len();

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(CONTENT_TYPE, media_type(asset, file))
            .header(CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(handle)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }

        Ok(())
    }
}

#[async_trait]
impl IssueReporter for GithubProvider {
    async fn comment_on_issue(
        &self,
        repository: &RepositoryTarget,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        let route = format!(
            "/repos/{owner}/{repo}/issues/{issue_number}/comments",
            owner = repository.owner,
            repo = repository.name,
            issue_number = issue_number
        );
        let payload = json!({ "body": body });

        let octocrab = &self.octocrab;
        let (route, payload) = (route.as_str(), &payload);

        self.limiter
            .run(octocrab, move || {
                octocrab.post::<_, serde_json::Value>(route, Some(payload))
            })
            .await?;

        Ok(())
    }
}

/// Drops the `{?name,label}` template tail and adds the asset's name and label.
pub fn upload_endpoint(upload_url: &str, asset: &Asset) -> Result<Url> {
    let base = match upload_url.find('{') {
        Some(index) => &upload_url[..index],
        None => upload_url,
    };

    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("name", &asset.name);
        if let Some(label) = asset.label.as_deref().filter(|label| !label.is_empty()) {
            query.append_pair("label", label);
        }
    }

    Ok(url)
}

/// Declared content type of the asset, else a guess from the file extension.
pub fn media_type(asset: &Asset, file: &Path) -> String {
    asset
        .content_type
        .clone()
        .filter(|content_type| !content_type.is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(file)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

pub fn is_already_exists(error: &octocrab::Error) -> bool {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            source.message.contains("already_exists")
                || source.errors.iter().flatten().any(|detail| {
                    detail.get("code").and_then(|code| code.as_str()) == Some("already_exists")
                })
        }
        _ => false,
    }
}

fn not_found(error: MigrateError, repository: &RepositoryTarget) -> MigrateError {
    match &error {
        MigrateError::Api(octocrab::Error::GitHub { source, .. })
            if source.status_code.as_u16() == 404 =>
        {
            MigrateError::NotFound(repository.to_string())
        }
        _ => error,
    }
}

async fn unexpected_status(response: Response) -> MigrateError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    MigrateError::UnexpectedStatus { status, body }
}
