//! # Remote Path Normalization
//!
//! Every backend addresses objects by `(bucket, key)` where the key is a
//! slash-separated path without a leading separator.

use super::errors::{StorageError, StorageResult};

/// Separator used in remote keys on every backend
pub const SEPARATOR: char = '/';

/// Build a remote path from a location prefix and a file name.
///
/// `remote_path("", "a.txt")` is `"a.txt"`, `remote_path("Test", "a.txt")`
/// is `"Test/a.txt"`.
pub fn remote_path(location: &str, file_name: &str) -> String {
    format!("{}{}{}", location, SEPARATOR, file_name)
        .trim_start_matches(SEPARATOR)
        .to_string()
}

/// Normalize a remote path into an object key.
///
/// Leading separators are stripped and repeated separators collapsed.
/// Empty keys and `.`/`..` segments are rejected.
pub fn normalize(path: &str) -> StorageResult<String> {
    let mut segments = Vec::new();

    for segment in path.split(SEPARATOR) {
        match segment {
            "" => continue,
            "." | ".." => {
                return Err(StorageError::invalid(format!(
                    "relative segment `{}` in remote path `{}`",
                    segment, path
                )))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(StorageError::invalid(format!("empty remote path `{}`", path)));
    }

    Ok(segments.join("/"))
}

/// Validate a bucket name
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() {
        return Err(StorageError::invalid("bucket name is empty"));
    }
    if bucket == "." || bucket == ".." || bucket.contains(['/', '\\']) {
        return Err(StorageError::invalid(format!("invalid bucket name `{}`", bucket)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::ErrorKind;

    #[test]
    fn test_remote_path() {
        assert_eq!(remote_path("", "test_file.ignore.txt"), "test_file.ignore.txt");
        assert_eq!(remote_path("Test", "test_file.ignore.txt"), "Test/test_file.ignore.txt");
        assert_eq!(remote_path("/Test", "a.txt"), "Test/a.txt");
    }

    #[test]
    fn test_leading_separator_stripped() {
        assert_eq!(normalize("/a/b.txt").unwrap(), normalize("a/b.txt").unwrap());
        assert_eq!(normalize("///a/b.txt").unwrap(), "a/b.txt");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("/x//y/z.txt").unwrap();
        assert_eq!(once, "x/y/z.txt");
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_backslash_is_not_a_separator() {
        assert_eq!(normalize("a\\b.txt").unwrap(), "a\\b.txt");
    }

    #[test]
    fn test_rejects_traversal_and_empty() {
        assert_eq!(normalize("../etc/passwd").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(normalize("a/./b").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(normalize("").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(normalize("///").unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_bucket_validation() {
        assert!(validate_bucket("myBucket").is_ok());
        assert!(validate_bucket("").is_err());
        assert!(validate_bucket("..").is_err());
        assert!(validate_bucket("a/b").is_err());
    }
}
