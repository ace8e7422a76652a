use std::path::Path;

use crate::config::ValidationConfig;
use crate::error::{AnalysisError, Result};

/// Reject local files that are missing, too large or of an unaccepted type.
pub fn check_local_file(path: &Path, config: &ValidationConfig) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| AnalysisError::io(path, e))?;
    if !metadata.is_file() {
        return Err(AnalysisError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !config.accepts_extension(ext) {
        return Err(AnalysisError::UnsupportedFormat(format!(
            "'{}' (accepted: {})",
            path.display(),
            config.extensions.join(", ")
        )));
    }

    check_size(metadata.len(), config)
}

pub fn check_size(size: u64, config: &ValidationConfig) -> Result<()> {
    let max = config.max_file_size_bytes();
    if size > max {
        return Err(AnalysisError::FileTooLarge { size, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn accepts_known_extension_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Song.FLAC");
        std::fs::write(&path, b"fLaC").unwrap();
        assert!(check_local_file(&path, &ValidationConfig::default()).is_ok());
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = check_local_file(&path, &ValidationConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = check_local_file(&dir.path().join("gone.wav"), &ValidationConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let config = ValidationConfig {
            max_file_size_mb: 1,
            ..ValidationConfig::default()
        };
        assert!(check_size(1024 * 1024, &config).is_ok());
        assert!(matches!(
            check_size(1024 * 1024 + 1, &config),
            Err(AnalysisError::FileTooLarge { .. })
        ));
    }
}
