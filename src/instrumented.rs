//! Logging decorator for file services.
//!
//! Backends emit no telemetry themselves; the host wraps whichever backend
//! it built in [`Instrumented`] to get one `tracing` event per call.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::file_storage::{FileMetadata, FileService, StorageResult};

/// A `FileService` that logs every contract call of the wrapped service
#[derive(Debug)]
pub struct Instrumented<S> {
    inner: S,
    backend: &'static str,
}

impl<S: FileService> Instrumented<S> {
    /// Wrap `inner`, tagging events with `backend`
    pub fn new(inner: S, backend: &'static str) -> Self {
        Self { inner, backend }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn record<T>(
        &self,
        operation: &'static str,
        bucket: &str,
        path: &str,
        started: Instant,
        result: &StorageResult<T>,
    ) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(_) => info!(
                backend = self.backend,
                operation,
                bucket,
                path,
                elapsed_ms,
                "storage call succeeded"
            ),
            Err(e) => warn!(
                backend = self.backend,
                operation,
                bucket,
                path,
                elapsed_ms,
                kind = %e.kind(),
                error = %e,
                "storage call failed"
            ),
        }
    }
}

impl<S: FileService> FileService for Instrumented<S> {
    fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        bucket: &str,
    ) -> StorageResult<FileMetadata> {
        let started = Instant::now();
        let result = self.inner.upload_file(local_path, remote_path, bucket);
        self.record("upload_file", bucket, remote_path, started, &result);
        result
    }

    fn download_file(
        &self,
        remote_path: &str,
        sink: &mut (dyn Write + Send),
        bucket: &str,
    ) -> StorageResult<u64> {
        let started = Instant::now();
        let result = self.inner.download_file(remote_path, sink, bucket);
        self.record("download_file", bucket, remote_path, started, &result);
        result
    }

    fn get_file_metadata(&self, remote_path: &str, bucket: &str) -> StorageResult<FileMetadata> {
        let started = Instant::now();
        let result = self.inner.get_file_metadata(remote_path, bucket);
        match &result {
            Ok(meta) => info!(
                backend = self.backend,
                operation = "get_file_metadata",
                bucket,
                path = remote_path,
                elapsed_ms = started.elapsed().as_millis() as u64,
                exists = meta.exists(),
                size = meta.size(),
                "storage call succeeded"
            ),
            Err(_) => self.record("get_file_metadata", bucket, remote_path, started, &result),
        }
        result
    }
}
