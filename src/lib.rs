//! cloudstore - a provider-agnostic file storage client
//!
//! Code against [`FileService`](file_storage::FileService) once and pick the
//! backend (local filesystem or S3-compatible store) through configuration.

pub mod cli;
pub mod config;
pub mod factory;
pub mod file_storage;
pub mod instrumented;

pub use config::{BackendKind, StorageConfig};
pub use file_storage::{ErrorKind, FileMetadata, FileService, StorageError, StorageResult};
pub use instrumented::Instrumented;
