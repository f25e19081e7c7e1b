//! # File Storage Module
//!
//! Provider-agnostic file storage: one contract, one implementation per
//! backend.

pub mod errors;
pub mod local;
pub mod metadata;
pub mod path;
pub mod policy;
pub mod remote;
pub mod service;

pub use errors::{ErrorKind, StorageError, StorageResult};
pub use local::LocalFileService;
pub use metadata::FileMetadata;
pub use path::{normalize, remote_path};
pub use policy::UploadPolicy;
pub use remote::{S3FileService, S3Settings};
pub use service::FileService;
