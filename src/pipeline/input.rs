//! Input resolution: turn a user-supplied path or URL into document bytes
//! plus the identity the cache keys them by.
//!
//! Local files are identified by their canonical path and downloads by their
//! full URL, so two `brief.docx` in different folders never share a cache
//! entry. The short file name is only for display and output naming.
//!
//! The whole package is read into memory; `.docx` letters are small and the
//! zip reader wants random access anyway. The zip magic (`PK\x03\x04`) is
//! checked here so callers get a clear "not a .docx" error instead of a zip
//! parse failure deep inside ingestion.

use super::docx::DOCX_MAGIC;
use crate::error::AutoTeiError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bytes of one input document and its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// Canonical path or URL; the cache key.
    pub identity: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP(S) URL to document bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, AutoTeiError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

async fn resolve_local(path_str: &str) -> Result<ResolvedInput, AutoTeiError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => AutoTeiError::PermissionDenied { path: path.clone() },
        _ => AutoTeiError::FileNotFound { path: path.clone() },
    })?;
    check_magic(path_str, &bytes)?;
    let canonical = tokio::fs::canonicalize(&path)
        .await
        .map_err(|_| AutoTeiError::FileNotFound { path: path.clone() })?;

    debug!("Resolved local document: {} ({} bytes)", canonical.display(), bytes.len());
    Ok(ResolvedInput {
        identity: canonical.to_string_lossy().into_owned(),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, AutoTeiError> {
    info!("Downloading document from: {}", url);

    let failed = |reason: String| AutoTeiError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AutoTeiError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    check_magic(url, &bytes)?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(ResolvedInput {
        identity: url.to_string(),
        bytes: bytes.to_vec(),
    })
}

fn check_magic(input: &str, bytes: &[u8]) -> Result<(), AutoTeiError> {
    if bytes.starts_with(&DOCX_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(AutoTeiError::NotADocx {
        input: input.to_string(),
        magic,
    })
}

/// Short name for an identity or raw input: the file name of a path, the
/// last path segment of a URL.
pub fn display_name(identity: &str) -> String {
    if is_url(identity) {
        name_for_url(identity)
    } else {
        name_for_path(Path::new(identity))
    }
}

/// The file name, or the whole path if it has none.
fn name_for_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The last URL path segment, or the URL itself.
fn name_for_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| url.to_string())
}
