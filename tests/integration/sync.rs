use std::path::Path;

use crate::mocks::github::{create_release_mock, download_mock, list_releases_mock, upload_mock};
use migrate_releases::{
    cli::{
        sync_releases, EndpointConfig, NetworkConfig, RepositorySelection, RepositoryTarget,
        SyncConfig,
    },
    fixtures::release::{already_exists_json, asset_json, created_release_json, release_json},
    github_provider::GithubProvider,
    sync::{Migrator, RunSummary},
};
use serde_json::json;
use wiremock::MockServer;

fn config(temp_dir: &Path, mapping_file: Option<&Path>) -> SyncConfig {
    SyncConfig {
        source: EndpointConfig {
            organization: Some("source-org".to_string()),
            token: "source-token".to_string(),
            hostname: None,
        },
        target: EndpointConfig {
            organization: Some("target-org".to_string()),
            token: "target-token".to_string(),
            hostname: None,
        },
        target_organization: "target-org".to_string(),
        repositories: RepositorySelection::Single("repo".to_string()),
        mapping_file: mapping_file.map(Path::to_path_buf),
        temp_dir: temp_dir.to_path_buf(),
        network: NetworkConfig::default(),
    }
}

fn repository() -> RepositoryTarget {
    RepositoryTarget {
        owner: "source-org".to_string(),
        name: "repo".to_string(),
    }
}

mod sync {
    use super::*;

    #[tokio::test]
    async fn migrates_releases_and_assets() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();
        let dir = tempfile::tempdir().unwrap();
        let mapping = dir.path().join("users.csv");
        std::fs::write(&mapping, "naruto,naruto-uzumaki\n").unwrap();
        let temp_dir = dir.path().join("tmp");

        list_releases_mock(
            "source-org",
            "repo",
            1,
            json!([
                release_json(
                    1,
                    "v1.0.0",
                    &uri,
                    vec![asset_json(10, "app.zip", &uri, "application/zip")]
                ),
                release_json(2, "v0.9.0", &uri, vec![])
            ]),
            None,
        )
        .mount(&mock_server)
        .await;
        create_release_mock(
            "target-org",
            "repo",
            "v1.0.0",
            201,
            created_release_json(101, "v1.0.0", &uri),
        )
        .mount(&mock_server)
        .await;
        create_release_mock("target-org", "repo", "v0.9.0", 422, already_exists_json())
            .mount(&mock_server)
            .await;
        download_mock("/downloads/app.zip", 200, b"zipdata", "application/zip")
            .mount(&mock_server)
            .await;
        upload_mock(101, "app.zip", "application/zip", 201)
            .mount(&mock_server)
            .await;

        let config = config(&temp_dir, Some(&mapping));
        let source = GithubProvider::configure("source-token", &uri, &config.network).unwrap();
        let target = GithubProvider::configure("target-token", &uri, &config.network).unwrap();

        let summary = Migrator::new(&source, &target, &config)
            .run(&[repository()])
            .await;

        assert_eq!(
            summary,
            RunSummary {
                total: 2,
                failed: 0,
                skipped: 1,
                asset_failures: 0,
            }
        );
        assert_eq!(std::fs::read_dir(&temp_dir).unwrap().count(), 0);

        let requests = mock_server.received_requests().await.unwrap();
        let created: serde_json::Value = requests
            .iter()
            .find(|request| {
                request.method.as_str() == "POST"
                    && request.url.path() == "/repos/target-org/repo/releases"
            })
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .unwrap();
        let body = created["body"].as_str().unwrap();
        assert!(body.starts_with("Release notes for v1.0.0 by @naruto-uzumaki in target-org/repo"));
        assert!(body.ends_with(
            ">Release Originally Created on: April 1, 2023 at 10:00:00 UTC\n> Release Originally Published on: April 2, 2023 at 11:30:00 UTC"
        ));
    }

    #[tokio::test]
    async fn partial_failure_completes_the_run() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();
        let dir = tempfile::tempdir().unwrap();

        list_releases_mock(
            "source-org",
            "repo",
            1,
            json!([
                release_json(
                    1,
                    "v1.0.0",
                    &uri,
                    vec![asset_json(10, "app.zip", &uri, "application/zip")]
                ),
                release_json(
                    2,
                    "v2.0.0",
                    &uri,
                    vec![asset_json(20, "missing.zip", &uri, "application/zip")]
                )
            ]),
            None,
        )
        .mount(&mock_server)
        .await;
        create_release_mock(
            "target-org",
            "repo",
            "v1.0.0",
            500,
            json!({ "message": "Server Error" }),
        )
        .expect(1..)
        .mount(&mock_server)
        .await;
        create_release_mock(
            "target-org",
            "repo",
            "v2.0.0",
            201,
            created_release_json(102, "v2.0.0", &uri),
        )
        .mount(&mock_server)
        .await;
        download_mock("/downloads/missing.zip", 404, b"Not Found", "text/plain")
            .mount(&mock_server)
            .await;

        let config = config(dir.path(), None);
        let source = GithubProvider::configure("source-token", &uri, &config.network).unwrap();
        let target = GithubProvider::configure("target-token", &uri, &config.network).unwrap();

        let summary = Migrator::new(&source, &target, &config)
            .run(&[repository()])
            .await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.asset_failures, 1);
    }

    #[tokio::test]
    async fn failed_releases_still_complete_successfully() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();
        let dir = tempfile::tempdir().unwrap();

        list_releases_mock(
            "source-org",
            "repo",
            1,
            json!([
                release_json(1, "v1.0.0", &uri, vec![]),
                release_json(2, "v2.0.0", &uri, vec![])
            ]),
            None,
        )
        .mount(&mock_server)
        .await;
        create_release_mock(
            "target-org",
            "repo",
            "v1.0.0",
            500,
            json!({ "message": "Server Error" }),
        )
        .expect(1..)
        .mount(&mock_server)
        .await;
        create_release_mock(
            "target-org",
            "repo",
            "v2.0.0",
            201,
            created_release_json(102, "v2.0.0", &uri),
        )
        .mount(&mock_server)
        .await;

        let config = config(dir.path(), None);
        let source = GithubProvider::configure("source-token", &uri, &config.network).unwrap();
        let target = GithubProvider::configure("target-token", &uri, &config.network).unwrap();

        let summary = sync_releases(&config, &source, &target, &|_| None)
            .await
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded(), 1);
    }

    #[tokio::test]
    async fn missing_repository_list_is_an_error() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();
        let dir = tempfile::tempdir().unwrap();

        let config = SyncConfig {
            repositories: RepositorySelection::List(dir.path().join("missing.txt")),
            ..config(dir.path(), None)
        };
        let source = GithubProvider::configure("source-token", &uri, &config.network).unwrap();
        let target = GithubProvider::configure("target-token", &uri, &config.network).unwrap();

        let result = sync_releases(&config, &source, &target, &|_| None).await;

        assert!(result.is_err());
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}
