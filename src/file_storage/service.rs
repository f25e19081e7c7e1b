//! # File Service Contract
//!
//! The operations every backend implements. Callers hold a backend behind
//! this trait and never see its native addressing scheme.
//!
//! Remote paths are normalized with [`normalize`](super::path::normalize)
//! before use, so `"/a/b.txt"` and `"a/b.txt"` address the same object.
//!
//! Existence policy: `get_file_metadata` never fails because an object is
//! absent, it returns metadata whose `exists()` is false. `download_file`
//! always fails with a `NotFound` error for an absent object.

use std::io::Write;
use std::path::Path;

use super::errors::StorageResult;
use super::metadata::FileMetadata;

/// Storage contract shared by all backends
pub trait FileService: Send + Sync + std::fmt::Debug {
    /// Copy the local file to `(bucket, remote_path)`, overwriting any
    /// existing object. The returned metadata always has `exists() == true`.
    fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        bucket: &str,
    ) -> StorageResult<FileMetadata>;

    /// Stream the object into `sink`, returning the number of bytes written.
    /// The sink stays owned by the caller and is not flushed or closed here.
    fn download_file(
        &self,
        remote_path: &str,
        sink: &mut (dyn Write + Send),
        bucket: &str,
    ) -> StorageResult<u64>;

    /// Read the current metadata of `(bucket, remote_path)`
    fn get_file_metadata(&self, remote_path: &str, bucket: &str) -> StorageResult<FileMetadata>;
}

impl<S: FileService + ?Sized> FileService for Box<S> {
    fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        bucket: &str,
    ) -> StorageResult<FileMetadata> {
        (**self).upload_file(local_path, remote_path, bucket)
    }

    fn download_file(
        &self,
        remote_path: &str,
        sink: &mut (dyn Write + Send),
        bucket: &str,
    ) -> StorageResult<u64> {
        (**self).download_file(remote_path, sink, bucket)
    }

    fn get_file_metadata(&self, remote_path: &str, bucket: &str) -> StorageResult<FileMetadata> {
        (**self).get_file_metadata(remote_path, bucket)
    }
}
