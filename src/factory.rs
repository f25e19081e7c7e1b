//! Backend construction.
//!
//! The one place that turns configuration into a concrete backend. Callers
//! receive the backend as `Box<dyn FileService>` and pass it on explicitly.

use crate::config::{BackendKind, StorageConfig};
use crate::file_storage::{FileService, LocalFileService, S3FileService, StorageResult};
use crate::instrumented::Instrumented;

/// Build the backend selected by `config`.
///
/// # Errors
///
/// Fails when the backend cannot be initialized, e.g. the local root cannot
/// be made absolute or S3 credentials cannot be resolved.
pub fn build_service(config: &StorageConfig) -> StorageResult<Box<dyn FileService>> {
    let service: Box<dyn FileService> = match config.backend {
        BackendKind::Local => Box::new(LocalFileService::with_policy(
            &config.local.root,
            config.upload.clone(),
        )?),
        BackendKind::S3 => Box::new(S3FileService::with_policy(&config.s3, config.upload.clone())?),
    };
    Ok(service)
}

/// Build the configured backend wrapped in a logging decorator
pub fn build_instrumented(config: &StorageConfig) -> StorageResult<Instrumented<Box<dyn FileService>>> {
    Ok(Instrumented::new(build_service(config)?, config.backend.as_str()))
}
