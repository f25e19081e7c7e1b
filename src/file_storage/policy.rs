//! # Upload Policy

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{StorageError, StorageResult};

/// Validation rules applied to every upload before any byte is transferred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Allowed file extensions without the dot, case-insensitive (empty = all)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Maximum file size in bytes (0 = unlimited)
    #[serde(default = "default_max_size")]
    pub max_file_size: u64,
}

fn default_allowed_extensions() -> Vec<String> {
    [
        "txt", "csv", "json", "xml", "log", "md", "pdf", "png", "jpg", "jpeg", "gif", "webp",
        "zip", "gz",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_size() -> u64 {
    100 * 1024 * 1024 // 100MB
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_file_size: default_max_size(),
        }
    }
}

impl UploadPolicy {
    /// Policy accepting every extension and size
    pub fn permissive() -> Self {
        Self {
            allowed_extensions: Vec::new(),
            max_file_size: 0,
        }
    }

    /// Check if the extension of `path` is allowed
    pub fn is_extension_allowed(&self, path: &Path) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }

        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext,
            None => return false,
        };

        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Check file size limit
    pub fn check_size(&self, size: u64) -> StorageResult<()> {
        if self.max_file_size > 0 && size > self.max_file_size {
            Err(StorageError::FileTooLarge(size, self.max_file_size))
        } else {
            Ok(())
        }
    }

    /// Validate a local file for upload, returning its size.
    ///
    /// The extension is checked first so a disallowed file type is reported
    /// as such even when the file itself is missing.
    pub fn validate(&self, local_path: &Path) -> StorageResult<u64> {
        if !self.is_extension_allowed(local_path) {
            return Err(StorageError::DisallowedExtension(
                local_path.display().to_string(),
            ));
        }

        let meta = match std::fs::metadata(local_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::invalid(format!(
                    "local file `{}` does not exist",
                    local_path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if !meta.is_file() {
            return Err(StorageError::invalid(format!(
                "local path `{}` is not a regular file",
                local_path.display()
            )));
        }

        self.check_size(meta.len())?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_extension_validation() {
        let mut policy = UploadPolicy::default();
        policy.allowed_extensions = vec!["txt".to_string(), ".PDF".to_string()];

        assert!(policy.is_extension_allowed(Path::new("test_file.ignore.txt")));
        assert!(policy.is_extension_allowed(Path::new("report.pdf")));
        assert!(policy.is_extension_allowed(Path::new("REPORT.TXT")));
        assert!(!policy.is_extension_allowed(Path::new("setup.exe")));
        assert!(!policy.is_extension_allowed(Path::new("Makefile")));
    }

    #[test]
    fn test_permissive() {
        let policy = UploadPolicy::permissive();
        assert!(policy.is_extension_allowed(Path::new("Makefile")));
        assert!(policy.check_size(u64::MAX).is_ok());
    }

    #[test]
    fn test_size_validation() {
        let mut policy = UploadPolicy::default();
        policy.max_file_size = 1024; // 1KB

        assert!(policy.check_size(500).is_ok());
        assert!(matches!(policy.check_size(2048), Err(StorageError::FileTooLarge(2048, 1024))));
    }

    #[test]
    fn test_validate_local_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("data.txt");
        std::fs::write(&file, b"hello").unwrap();

        let policy = UploadPolicy::default();
        assert_eq!(policy.validate(&file).unwrap(), 5);

        let missing = policy.validate(&temp.path().join("missing.txt")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::InvalidArgument);

        let dir = temp.path().join("folder.txt");
        std::fs::create_dir(&dir).unwrap();
        assert_eq!(policy.validate(&dir).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_validate_disallowed_extension() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("tool.exe");
        std::fs::write(&file, b"MZ").unwrap();

        let err = UploadPolicy::default().validate(&file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().ends_with("valid file extension"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let policy: UploadPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, UploadPolicy::default());
    }
}
