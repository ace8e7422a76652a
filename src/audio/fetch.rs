use reqwest::Url;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::validate;
use crate::config::{FetchConfig, ValidationConfig};
use crate::error::{AnalysisError, Result};

/// Downloaded audio held in a temporary file. The file is removed when this
/// value is dropped, whichever way the caller leaves its scope.
pub struct Download {
    file: NamedTempFile,
}

impl Download {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// GET `url` and store the body in a temporary file.
pub fn download(url: &Url, fetch: &FetchConfig, validation: &ValidationConfig) -> Result<Download> {
    let fetch_err = |source: reqwest::Error| AnalysisError::Fetch {
        url: url.to_string(),
        source,
    };

    log::info!("Fetching {} (timeout {}s)", url, fetch.timeout_secs);

    let client = reqwest::blocking::Client::builder()
        .timeout(fetch.timeout())
        .build()
        .map_err(fetch_err)?;

    let response = client.get(url.clone()).send().map_err(fetch_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(AnalysisError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(len) = response.content_length() {
        validate::check_size(len, validation)?;
    }

    let body = response.bytes().map_err(fetch_err)?;
    validate::check_size(body.len() as u64, validation)?;

    let suffix = url_extension(url).map(|ext| format!(".{}", ext)).unwrap_or_default();
    let mut builder = tempfile::Builder::new();
    builder.prefix("trackscan-").suffix(&suffix);

    let dir = temp_root(fetch);
    let mut file = builder.tempfile_in(&dir).map_err(|e| AnalysisError::io(&dir, e))?;

    write_body(&mut file, &body).map_err(|e| AnalysisError::io(file.path(), e))?;

    log::debug!("Stored {} bytes in {}", body.len(), file.path().display());

    Ok(Download { file })
}

fn write_body(file: &mut NamedTempFile, body: &[u8]) -> std::io::Result<()> {
    file.write_all(body)?;
    file.flush()
}

/// File extension of the last path segment, used as a decoder hint.
fn url_extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

fn temp_root(fetch: &FetchConfig) -> PathBuf {
    fetch.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_comes_from_last_segment() {
        let url = Url::parse("https://cdn.example.com/a.b/track.MP3?sig=abc").unwrap();
        assert_eq!(url_extension(&url).as_deref(), Some("mp3"));
    }

    #[test]
    fn no_extension_for_bare_paths() {
        let url = Url::parse("https://cdn.example.com/stream/12345").unwrap();
        assert_eq!(url_extension(&url), None);
        let url = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(url_extension(&url), None);
    }
}
