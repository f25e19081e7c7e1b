//! # S3-Compatible Backend
//!
//! Talks to a real object store through the `rust-s3` blocking client.
//! Authentication, transport and retries belong to the SDK; this module only
//! maps the contract onto object keys and presigned URLs.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::{Deserialize, Serialize};

use super::errors::{StorageError, StorageResult};
use super::metadata::FileMetadata;
use super::path::{normalize, validate_bucket};
use super::policy::UploadPolicy;
use super::service::FileService;

/// Connection settings for an S3-compatible store
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Settings {
    /// Region name, e.g. `us-east-1`
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for MinIO, R2, GCS interop and friends
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`
    #[serde(default)]
    pub path_style: bool,

    /// Access key; the SDK credential chain is used when unset
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    /// Lifetime of presigned URLs in seconds
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u32,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_presign_expiry() -> u32 {
    3600
}

/// Longest lifetime S3 accepts for a presigned URL (7 days)
pub const MAX_PRESIGN_EXPIRY_SECS: u32 = 7 * 24 * 3600;

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            path_style: false,
            access_key: None,
            secret_key: None,
            presign_expiry_secs: default_presign_expiry(),
        }
    }
}

// Keeps the secret key out of logs.
impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("path_style", &self.path_style)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("presign_expiry_secs", &self.presign_expiry_secs)
            .finish()
    }
}

impl S3Settings {
    fn region(&self) -> StorageResult<Region> {
        match &self.endpoint {
            Some(endpoint) => Ok(Region::Custom {
                region: self.region.clone(),
                endpoint: endpoint.clone(),
            }),
            None => self
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::invalid(format!("invalid region `{}`: {}", self.region, e))),
        }
    }

    fn credentials(&self) -> StorageResult<Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access.as_str()), Some(secret.as_str()), None, None, None)
                    .map_err(StorageError::transport)
            }
            (None, None) => Credentials::default().map_err(StorageError::transport),
            _ => Err(StorageError::invalid(
                "access_key and secret_key must be set together",
            )),
        }
    }
}

/// S3-compatible storage backend
pub struct S3FileService {
    region: Region,
    credentials: Credentials,
    path_style: bool,
    presign_expiry_secs: u32,
    policy: UploadPolicy,
}

impl fmt::Debug for S3FileService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3FileService")
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .field("presign_expiry_secs", &self.presign_expiry_secs)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl S3FileService {
    /// Create a new S3 backend with the default policy
    pub fn new(settings: &S3Settings) -> StorageResult<Self> {
        Self::with_policy(settings, UploadPolicy::default())
    }

    /// Create a new S3 backend with an explicit upload policy
    pub fn with_policy(settings: &S3Settings, policy: UploadPolicy) -> StorageResult<Self> {
        if settings.presign_expiry_secs == 0 || settings.presign_expiry_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(StorageError::invalid(format!(
                "presign_expiry_secs must be between 1 and {}",
                MAX_PRESIGN_EXPIRY_SECS
            )));
        }

        Ok(Self {
            region: settings.region()?,
            credentials: settings.credentials()?,
            path_style: settings.path_style,
            presign_expiry_secs: settings.presign_expiry_secs,
            policy,
        })
    }

    fn bucket(&self, name: &str) -> StorageResult<Bucket> {
        validate_bucket(name)?;
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        if self.path_style {
            Ok(bucket.with_path_style())
        } else {
            Ok(bucket)
        }
    }

    fn head(&self, bucket: &Bucket, bucket_name: &str, key: &str) -> StorageResult<FileMetadata> {
        let (head, status) = bucket.head_object(key)?;
        if status == 404 {
            return Ok(FileMetadata::absent(bucket_name, key));
        }
        check_status(status, "HEAD", key)?;

        let size = head.content_length.unwrap_or(0).max(0) as u64;
        let last_modified = match head.last_modified.as_deref() {
            Some(raw) => parse_http_date(raw)?,
            None => Utc::now(),
        };
        let url = bucket.presign_get(key, self.presign_expiry_secs, None)?;

        Ok(FileMetadata::found(bucket_name, key, size, last_modified, url))
    }
}

impl FileService for S3FileService {
    fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        bucket: &str,
    ) -> StorageResult<FileMetadata> {
        let key = normalize(remote_path)?;
        let handle = self.bucket(bucket)?;
        self.policy.validate(local_path)?;

        let mut file = File::open(local_path)?;
        let status = handle.put_object_stream(&mut file, &key)?;
        check_status(status, "PUT", &key)?;

        let metadata = self.head(&handle, bucket, &key)?;
        if !metadata.exists() {
            return Err(StorageError::transport(format!(
                "object `{}/{}` not visible after upload",
                bucket, key
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
        let key = normalize(remote_path)?;
        let handle = self.bucket(bucket)?;

        // The SDK copies any response body into the writer, error documents
        // included, so absence is settled by HEAD before the GET starts.
        let (_, status) = handle.head_object(&key)?;
        if status == 404 {
            return Err(StorageError::not_found(bucket, &key));
        }
        check_status(status, "HEAD", &key)?;

        let mut counter = CountingWriter::new(sink);
        let status = handle.get_object_to_writer(&key, &mut counter)?;
        download_status(status, bucket, &key)?;
        Ok(counter.written())
    }

    fn get_file_metadata(&self, remote_path: &str, bucket: &str) -> StorageResult<FileMetadata> {
        let key = normalize(remote_path)?;
        let handle = self.bucket(bucket)?;
        self.head(&handle, bucket, &key)
    }
}

/// Counts the bytes the SDK streams into the caller's sink
struct CountingWriter<'a> {
    inner: &'a mut (dyn Write + Send),
    written: u64,
}

impl<'a> CountingWriter<'a> {
    fn new(inner: &'a mut (dyn Write + Send)) -> Self {
        Self { inner, written: 0 }
    }

    fn written(&self) -> u64 {
        self.written
    }
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn download_status(status: u16, bucket: &str, key: &str) -> StorageResult<()> {
    if status == 404 {
        return Err(StorageError::not_found(bucket, key));
    }
    check_status(status, "GET", key)
}

fn check_status(status: u16, method: &str, key: &str) -> StorageResult<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::transport(format!(
            "{} `{}` failed with HTTP status {}",
            method, key, status
        )))
    }
}

/// Parse a `Last-Modified` header value (RFC 7231 IMF-fixdate)
fn parse_http_date(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::transport(format!("invalid Last-Modified `{}`: {}", raw, e)))
}
