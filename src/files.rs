use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{self, File};
use url::Url;

use crate::error::{MigrateError, Result};

pub async fn open_file(path: &Path) -> Result<File> {
    File::open(path)
        .await
        .map_err(|error| MigrateError::io(path, error))
}

pub async fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .await
        .map_err(|error| MigrateError::io(path, error))
}

pub async fn create_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_vec_pretty(data)?;

    fs::write(path, content)
        .await
        .map_err(|error| MigrateError::io(path, error))
}

pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|error| MigrateError::io(path, error))
}

/// One repository per line. URLs contribute their path, blank lines are skipped.
pub async fn read_repository_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|error| MigrateError::io(path, error))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(repository_from_line)
        .collect())
}

fn repository_from_line(line: &str) -> String {
    match Url::parse(line) {
        Ok(url) if url.has_host() => url.path().trim_start_matches('/').to_string(),
        _ => line.to_string(),
    }
}

pub fn temp_path(dir: &Path, file_name: &str) -> PathBuf {
    let file_name = Path::new(file_name)
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| file_name.into());

    dir.join(file_name)
}
