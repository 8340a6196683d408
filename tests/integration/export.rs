use crate::mocks::github::{download_mock, list_releases_mock};
use migrate_releases::{
    cli::{EndpointConfig, ExportConfig, NetworkConfig, RepositoryTarget},
    export::Exporter,
    fixtures::release::{asset_json, release_json},
    github_provider::GithubProvider,
    release::Release,
};
use serde_json::json;
use wiremock::MockServer;

fn config(output_dir: &std::path::Path, archives: bool) -> ExportConfig {
    ExportConfig {
        source: EndpointConfig {
            organization: Some("source-org".to_string()),
            token: "token".to_string(),
            hostname: None,
        },
        repository: "repo".to_string(),
        file_prefix: None,
        output_dir: output_dir.to_path_buf(),
        archives,
        network: NetworkConfig::default(),
    }
}

async fn mount_releases(mock_server: &MockServer) {
    let uri = mock_server.uri();
    list_releases_mock(
        "source-org",
        "repo",
        1,
        json!([
            release_json(
                1,
                "v1.2.0",
                &uri,
                vec![asset_json(10, "app.zip", &uri, "application/zip")]
            ),
            release_json(2, "release-2", &uri, vec![])
        ]),
        None,
    )
    .mount(mock_server)
    .await;
}

fn repository() -> RepositoryTarget {
    RepositoryTarget {
        owner: "source-org".to_string(),
        name: "repo".to_string(),
    }
}

#[tokio::test]
async fn exports_release_files() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_releases(&mock_server).await;

    let config = config(dir.path(), false);
    let provider =
        GithubProvider::configure("token", &mock_server.uri(), &config.network).unwrap();

    let summary = Exporter::new(&provider, &config)
        .run(&repository())
        .await
        .unwrap();

    assert_eq!(
        summary.files,
        vec![dir.path().join("release-0.json"), dir.path().join("release-1.json")]
    );
    let first: Release =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("release-0.json")).unwrap())
            .unwrap();
    let second: Release =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("release-1.json")).unwrap())
            .unwrap();
    assert_eq!(first.tag_name.as_deref(), Some("v1.2.0"));
    assert_eq!(first.assets[0].name, "app.zip");
    assert_eq!(second.tag_name.as_deref(), Some("release-2"));
}

#[tokio::test]
async fn exported_files_keep_the_whole_payload() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    let dir = tempfile::tempdir().unwrap();
    mount_releases(&mock_server).await;

    let config = config(dir.path(), false);
    let provider = GithubProvider::configure("token", &uri, &config.network).unwrap();

    Exporter::new(&provider, &config)
        .run(&repository())
        .await
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("release-0.json")).unwrap())
            .unwrap();
    assert_eq!(
        written,
        release_json(
            1,
            "v1.2.0",
            &uri,
            vec![asset_json(10, "app.zip", &uri, "application/zip")]
        )
    );
    assert_eq!(written["author"]["login"], "naruto");
    assert_eq!(written["assets"][0]["download_count"], 42);
}

#[tokio::test]
async fn exports_archives() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_releases(&mock_server).await;
    download_mock("/archives/v1.2.0.zip", 200, b"zip", "application/zip")
        .mount(&mock_server)
        .await;
    download_mock("/archives/v1.2.0.tar.gz", 200, b"tar", "application/x-gzip")
        .mount(&mock_server)
        .await;
    download_mock("/archives/release-2.zip", 200, b"zip", "application/zip")
        .mount(&mock_server)
        .await;
    download_mock("/archives/release-2.tar.gz", 200, b"<html>", "text/html")
        .mount(&mock_server)
        .await;

    let config = config(dir.path(), true);
    let provider =
        GithubProvider::configure("token", &mock_server.uri(), &config.network).unwrap();

    let summary = Exporter::new(&provider, &config)
        .run(&repository())
        .await
        .unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(
        summary.archives,
        vec![
            dir.path().join("repo-1.2.0.zip"),
            dir.path().join("repo-1.2.0.tar.gz"),
            dir.path().join("repo-release-2.zip"),
        ]
    );
    assert_eq!(summary.archive_failures, 1);
}
