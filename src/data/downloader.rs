//! Downloader for remote star catalog exports
//!
//! Downloads go to a temporary file first and are renamed into the cache on
//! success, so an interrupted transfer never leaves a partial catalog
//! behind. A small JSON manifest records what each cached file came from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::InstcatError;
use crate::Result;

const MANIFEST_NAME: &str = "manifest.json";

/// Get the cache directory path
pub fn get_cache_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("instcat")
}

/// Ensure that the cache directory exists
pub fn ensure_cache_dir() -> Result<PathBuf> {
    let cache_dir = get_cache_dir();
    fs::create_dir_all(&cache_dir).map_err(InstcatError::IoError)?;
    Ok(cache_dir)
}

/// Provenance record for one cached catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    url: String,
    retrieved: String,
}

fn manifest_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(MANIFEST_NAME)
}

fn load_manifest(cache_dir: &Path) -> HashMap<String, ManifestEntry> {
    let path = manifest_path(cache_dir);
    match fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => HashMap::new(),
    }
}

fn store_manifest(cache_dir: &Path, manifest: &HashMap<String, ManifestEntry>) -> Result<()> {
    let text = serde_json::to_string_pretty(manifest)
        .map_err(|e| InstcatError::DataError(format!("Failed to encode manifest: {}", e)))?;
    fs::write(manifest_path(cache_dir), text).map_err(InstcatError::IoError)?;
    Ok(())
}

/// File name a URL caches under: its final path segment
fn cache_file_name(url: &str) -> Result<String> {
    let name = url.rsplit('/').next().unwrap_or("");
    if name.is_empty() || name.contains('?') {
        return Err(InstcatError::DownloadError(format!(
            "Cannot derive a cache file name from URL: {}",
            url
        )));
    }
    Ok(name.to_string())
}

/// Download a file from URL to a local path
fn download_file<P: AsRef<Path>>(url: &str, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent).map_err(InstcatError::IoError)?;
    }

    // Write to a temporary file first to avoid partial downloads
    let temp_path = path.as_ref().with_extension("tmp");
    let mut file = BufWriter::new(File::create(&temp_path).map_err(InstcatError::IoError)?);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| InstcatError::DownloadError(format!("Failed to create HTTP client: {}", e)))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| InstcatError::DownloadError(format!("Failed to download file: {}", e)))?;

    if !response.status().is_success() {
        return Err(InstcatError::DownloadError(format!(
            "Failed to download file, status: {}",
            response.status()
        )));
    }

    let mut buffer = [0; 8192];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| InstcatError::DownloadError(format!("Failed to read response: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(InstcatError::IoError)?;
    }

    file.flush().map_err(InstcatError::IoError)?;
    drop(file);

    fs::rename(temp_path, path).map_err(InstcatError::IoError)?;
    Ok(())
}

/// Fetch a star catalog export, caching it locally.
///
/// Returns the cached path without touching the network when the file is
/// already present and non-empty.
pub fn fetch_star_catalog(url: &str) -> Result<PathBuf> {
    let cache_dir = ensure_cache_dir()?;
    let file_name = cache_file_name(url)?;
    let target = cache_dir.join(&file_name);

    let already_cached = fs::metadata(&target)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false);
    if already_cached {
        log::debug!("Using cached star catalog: {}", target.display());
        return Ok(target);
    }

    println!("Downloading star catalog from {}...", url);
    download_file(url, &target)?;

    let mut manifest = load_manifest(&cache_dir);
    manifest.insert(
        file_name,
        ManifestEntry {
            url: url.to_string(),
            retrieved: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        },
    );
    store_manifest(&cache_dir, &manifest)?;

    Ok(target)
}

/// Resolve a star catalog argument: a local path is used as given, an
/// http(s) URL is fetched through the cache.
pub fn resolve_star_catalog(source: &str) -> Result<PathBuf> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return fetch_star_catalog(source);
    }

    let path = PathBuf::from(source);
    if !path.exists() {
        return Err(InstcatError::DataError(format!(
            "{} does not exist",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_name_from_url() {
        assert_eq!(
            cache_file_name("https://example.org/catalogs/stars_v3.csv.gz").unwrap(),
            "stars_v3.csv.gz"
        );
        assert!(cache_file_name("https://example.org/").is_err());
        assert!(cache_file_name("https://example.org/download?id=3").is_err());
    }

    #[test]
    fn test_resolve_local_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_star_catalog(file.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved, file.path());

        assert!(resolve_star_catalog("/no/such/stars.csv").is_err());
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = HashMap::new();
        manifest.insert(
            "stars.csv".to_string(),
            ManifestEntry {
                url: "https://example.org/stars.csv".to_string(),
                retrieved: "2026-08-06".to_string(),
            },
        );
        store_manifest(dir.path(), &manifest).unwrap();

        let loaded = load_manifest(dir.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["stars.csv"].url, "https://example.org/stars.csv");
    }
}
