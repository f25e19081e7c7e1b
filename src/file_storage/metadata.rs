//! # File Metadata
//!
//! Uniform descriptor returned by every backend. A value is a snapshot of
//! backend state at call time and is never updated afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    name: String,
    bucket: String,
    size: u64,
    last_modified: Option<DateTime<Utc>>,
    signed_url: Option<String>,
}

impl FileMetadata {
    /// Metadata of an object that exists
    pub fn found(
        bucket: &str,
        name: &str,
        size: u64,
        last_modified: DateTime<Utc>,
        signed_url: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            bucket: bucket.to_string(),
            size,
            last_modified: Some(last_modified),
            signed_url: Some(signed_url),
        }
    }

    /// Metadata of an address with no object behind it
    pub fn absent(bucket: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            bucket: bucket.to_string(),
            size: 0,
            last_modified: None,
            signed_url: None,
        }
    }

    /// Normalized remote path, never starts with `/`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Byte length; 0 when the object does not exist
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Absolute local path (filesystem backend) or presigned URL (remote backend)
    pub fn signed_url(&self) -> Option<&str> {
        self.signed_url.as_deref()
    }

    /// Whether the object existed when the metadata was read
    pub fn exists(&self) -> bool {
        self.last_modified.is_some()
    }
}
