use std::time::Duration;

use crate::mocks::github::{list_releases_mock, rate_limit_status_mock, rate_limited_mock};
use migrate_releases::{
    cli::{NetworkConfig, RepositoryTarget},
    error::MigrateError,
    fixtures::release::{rate_limit_json, release_json},
    github_provider::GithubProvider,
    provider::ReleaseSource,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repository() -> RepositoryTarget {
    RepositoryTarget {
        owner: "source-org".to_string(),
        name: "repo".to_string(),
    }
}

fn network(max_rate_limit_wait: Duration) -> NetworkConfig {
    NetworkConfig {
        request_timeout: Duration::from_secs(10),
        max_rate_limit_wait,
    }
}

#[tokio::test]
async fn follows_pagination() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    let next = format!("{uri}/repos/source-org/repo/releases?per_page=100&page=2");

    list_releases_mock(
        "source-org",
        "repo",
        1,
        json!([
            release_json(1, "v1.0.0", &uri, vec![]),
            release_json(2, "v1.1.0", &uri, vec![])
        ]),
        Some(&next),
    )
    .mount(&mock_server)
    .await;
    list_releases_mock(
        "source-org",
        "repo",
        2,
        json!([release_json(3, "v2.0.0", &uri, vec![])]),
        None,
    )
    .mount(&mock_server)
    .await;

    let provider =
        GithubProvider::configure("token", &uri, &network(Duration::from_secs(60))).unwrap();

    let releases = provider.list_releases(&repository()).await.unwrap();

    let tags: Vec<_> = releases
        .iter()
        .map(|release| release.tag_name.as_deref().unwrap())
        .collect();
    assert_eq!(tags, vec!["v1.0.0", "v1.1.0", "v2.0.0"]);
}

#[tokio::test]
async fn failed_page_fails_the_listing() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    let next = format!("{uri}/repos/source-org/repo/releases?per_page=100&page=2");

    list_releases_mock(
        "source-org",
        "repo",
        1,
        json!([release_json(1, "v1.0.0", &uri, vec![])]),
        Some(&next),
    )
    .mount(&mock_server)
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/source-org/repo/releases"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&mock_server)
        .await;

    let provider =
        GithubProvider::configure("token", &uri, &network(Duration::from_secs(60))).unwrap();

    let result = provider.list_releases(&repository()).await;

    assert!(matches!(result, Err(MigrateError::Api(_))));
}

#[tokio::test]
async fn missing_repository_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/source-org/repo/releases"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&mock_server)
        .await;

    let provider = GithubProvider::configure(
        "token",
        &mock_server.uri(),
        &network(Duration::from_secs(60)),
    )
    .unwrap();

    let result = provider.list_releases(&repository()).await;

    assert!(matches!(result, Err(MigrateError::NotFound(name)) if name == "source-org/repo"));
}

#[tokio::test]
async fn waits_for_rate_limit_reset() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();

    rate_limited_mock("source-org", "repo")
        .mount(&mock_server)
        .await;
    rate_limit_status_mock(rate_limit_json(chrono::Utc::now().timestamp()))
        .expect(1)
        .mount(&mock_server)
        .await;
    list_releases_mock(
        "source-org",
        "repo",
        1,
        json!([release_json(1, "v1.0.0", &uri, vec![])]),
        None,
    )
    .mount(&mock_server)
    .await;

    let provider =
        GithubProvider::configure("token", &uri, &network(Duration::from_secs(60))).unwrap();

    let releases = provider.list_releases(&repository()).await.unwrap();

    assert_eq!(releases.len(), 1);
}

#[tokio::test]
async fn gives_up_when_reset_is_too_far() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();

    rate_limited_mock("source-org", "repo")
        .mount(&mock_server)
        .await;
    rate_limit_status_mock(rate_limit_json(chrono::Utc::now().timestamp() + 3600))
        .mount(&mock_server)
        .await;

    let provider =
        GithubProvider::configure("token", &uri, &network(Duration::from_secs(5))).unwrap();

    let result = provider.list_releases(&repository()).await;

    assert!(matches!(result, Err(MigrateError::RateLimited { .. })));
}
