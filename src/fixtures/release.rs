use serde_json::{json, Value};

/// A release as the list endpoint returns it, with archive and upload URLs on `base_uri`.
pub fn release_json(id: u64, tag: &str, base_uri: &str, assets: Vec<Value>) -> Value {
    json!({
        "url": format!("{base_uri}/repos/source-org/repo/releases/{id}"),
        "id": id,
        "node_id": format!("RE_{id}"),
        "author": { "login": "naruto", "id": 1, "type": "User" },
        "tag_name": tag,
        "target_commitish": "main",
        "name": format!("Release {tag}"),
        "body": format!("Release notes for {tag} by @naruto in source-org/repo"),
        "draft": false,
        "prerelease": false,
        "created_at": "2023-04-01T10:00:00Z",
        "published_at": "2023-04-02T11:30:00Z",
        "html_url": format!("{base_uri}/source-org/repo/releases/tag/{tag}"),
        "upload_url": format!("{base_uri}/uploads/releases/{id}/assets{{?name,label}}"),
        "zipball_url": format!("{base_uri}/archives/{tag}.zip"),
        "tarball_url": format!("{base_uri}/archives/{tag}.tar.gz"),
        "assets": assets,
    })
}

pub fn asset_json(id: u64, name: &str, base_uri: &str, content_type: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "label": "",
        "content_type": content_type,
        "size": 7,
        "download_count": 42,
        "state": "uploaded",
        "browser_download_url": format!("{base_uri}/downloads/{name}"),
    })
}

/// What the create-release endpoint answers, pointing uploads back at `base_uri`.
pub fn created_release_json(id: u64, tag: &str, base_uri: &str) -> Value {
    json!({
        "id": id,
        "tag_name": tag,
        "upload_url": format!("{base_uri}/uploads/releases/{id}/assets{{?name,label}}"),
        "assets": [],
    })
}

/// The validation error GitHub returns when the tag already has a release.
pub fn already_exists_json() -> Value {
    json!({
        "message": "Validation Failed",
        "errors": [{ "resource": "Release", "code": "already_exists", "field": "tag_name" }],
        "documentation_url": "https://docs.github.com/rest/releases/releases#create-a-release"
    })
}

pub fn rate_limit_json(reset: i64) -> Value {
    json!({
        "resources": {
            "core": { "limit": 5000, "remaining": 0, "reset": reset, "used": 5000 }
        },
        "rate": { "limit": 5000, "remaining": 0, "reset": reset, "used": 5000 }
    })
}
