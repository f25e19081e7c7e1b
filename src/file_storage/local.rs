//! # Local Filesystem Backend
//!
//! Emulates an object store on disk. Objects live at
//! `{root}/{bucket}/{key}`; the absolute path doubles as the signed URL.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::errors::{StorageError, StorageResult};
use super::metadata::FileMetadata;
use super::path::{normalize, validate_bucket};
use super::policy::UploadPolicy;
use super::service::FileService;

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalFileService {
    root: PathBuf,
    policy: UploadPolicy,
}

impl LocalFileService {
    /// Create a new local backend rooted at `root` with the default policy
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        Self::with_policy(root, UploadPolicy::default())
    }

    /// Create a new local backend with an explicit upload policy
    pub fn with_policy(root: impl AsRef<Path>, policy: UploadPolicy) -> StorageResult<Self> {
        let root = std::path::absolute(root.as_ref())?;
        Ok(Self { root, policy })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `(bucket, key)` to its on-disk location
    fn full_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.root.join(bucket);
        path.extend(key.split('/'));
        path
    }

    fn resolve(&self, remote_path: &str, bucket: &str) -> StorageResult<(String, PathBuf)> {
        validate_bucket(bucket)?;
        let key = normalize(remote_path)?;
        let path = self.full_path(bucket, &key);
        Ok((key, path))
    }

    fn is_same_file(source: &Path, target: &Path) -> StorageResult<bool> {
        match fs::canonicalize(target) {
            Ok(target) => Ok(fs::canonicalize(source)? == target),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn stat(bucket: &str, key: &str, path: &Path) -> StorageResult<FileMetadata> {
        let meta = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Ok(FileMetadata::absent(bucket, key)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(FileMetadata::absent(bucket, key))
            }
            Err(e) => return Err(e.into()),
        };

        let modified: DateTime<Utc> = meta.modified()?.into();
        Ok(FileMetadata::found(
            bucket,
            key,
            meta.len(),
            modified,
            path.display().to_string(),
        ))
    }
}

impl FileService for LocalFileService {
    fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        bucket: &str,
    ) -> StorageResult<FileMetadata> {
        let (key, full_path) = self.resolve(remote_path, bucket)?;
        self.policy.validate(local_path)?;

        // Create parent directories
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Copying a file onto itself truncates it before the read.
        if !Self::is_same_file(local_path, &full_path)? {
            fs::copy(local_path, &full_path)?;
        }

        let metadata = Self::stat(bucket, &key, &full_path)?;
        if !metadata.exists() {
            return Err(StorageError::transport(format!(
                "object `{}` vanished after upload",
                full_path.display()
            )));
        }
        Ok(metadata)
    }

    fn download_file(
        &self,
        remote_path: &str,
        sink: &mut (dyn Write + Send),
        bucket: &str,
    ) -> StorageResult<u64> {
        let (key, full_path) = self.resolve(remote_path, bucket)?;

        let mut file = match File::open(&full_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(bucket, &key))
            }
            Err(e) => return Err(e.into()),
        };

        if !file.metadata()?.is_file() {
            return Err(StorageError::not_found(bucket, &key));
        }

        Ok(io::copy(&mut file, sink)?)
    }

    fn get_file_metadata(&self, remote_path: &str, bucket: &str) -> StorageResult<FileMetadata> {
        let (key, full_path) = self.resolve(remote_path, bucket)?;
        Self::stat(bucket, &key, &full_path)
    }
}
