//! CLI command implementations
//!
//! Each command builds exactly one backend through the factory from the
//! loaded config and makes a single contract call.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::factory;
use crate::file_storage::{remote_path, FileService, StorageError};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Run a parsed command against the backend described by `config`
pub fn run_command(config: &StorageConfig, command: Command) -> CliResult<Value> {
    debug!(backend = config.backend.as_str(), "configuration loaded");

    let service = factory::build_instrumented(config)?;
    execute(&service, config, command)
}

/// Execute `command` against an already constructed service
pub fn execute<S: FileService>(
    service: &S,
    config: &StorageConfig,
    command: Command,
) -> CliResult<Value> {
    match command {
        Command::Upload {
            local_path,
            location,
            bucket,
        } => {
            let bucket = resolve_bucket(bucket, config)?;
            upload(service, &local_path, &location, &bucket)
        }
        Command::Download {
            remote_path,
            destination,
            bucket,
        } => {
            let bucket = resolve_bucket(bucket, config)?;
            download(service, &remote_path, &destination, &bucket)
        }
        Command::Metadata {
            remote_path,
            bucket,
        } => {
            let bucket = resolve_bucket(bucket, config)?;
            metadata(service, &remote_path, &bucket)
        }
    }
}

fn resolve_bucket(bucket: Option<String>, config: &StorageConfig) -> CliResult<String> {
    bucket
        .or_else(|| config.default_bucket.clone())
        .ok_or_else(CliError::missing_bucket)
}

/// Upload `local_path` under `location`, keeping its file name
pub fn upload<S: FileService>(
    service: &S,
    local_path: &Path,
    location: &str,
    bucket: &str,
) -> CliResult<Value> {
    let file_name = local_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::io_error(format!("`{}` has no file name", local_path.display())))?;

    let target = remote_path(location, file_name);
    let meta = service.upload_file(local_path, &target, bucket)?;
    Ok(serde_json::to_value(&meta)?)
}

/// Download into `destination`; the file is created here and closed on return
pub fn download<S: FileService>(
    service: &S,
    remote: &str,
    destination: &Path,
    bucket: &str,
) -> CliResult<Value> {
    // Check first so a missing object does not leave an empty file behind.
    let meta = service.get_file_metadata(remote, bucket)?;
    if !meta.exists() {
        return Err(StorageError::NotFound {
            bucket: bucket.to_string(),
            path: meta.name().to_string(),
        }
        .into());
    }

    let mut file = File::create(destination)?;
    let written = service
        .download_file(remote, &mut file, bucket)
        .map_err(CliError::from)
        .and_then(|bytes| {
            file.flush()?;
            Ok(bytes)
        });
    drop(file);

    let bytes = match written {
        Ok(bytes) => bytes,
        Err(e) => {
            // A truncated object must not look like a finished download.
            if let Err(remove_err) = fs::remove_file(destination) {
                warn!(
                    destination = %destination.display(),
                    error = %remove_err,
                    "failed to remove partial download"
                );
            }
            return Err(e);
        }
    };

    Ok(json!({
        "bucket": bucket,
        "name": meta.name(),
        "destination": destination.display().to_string(),
        "bytes": bytes,
    }))
}

/// Report metadata of `(bucket, remote)`, including absent objects
pub fn metadata<S: FileService>(service: &S, remote: &str, bucket: &str) -> CliResult<Value> {
    let meta = service.get_file_metadata(remote, bucket)?;
    let mut value = serde_json::to_value(&meta)?;
    value["exists"] = Value::Bool(meta.exists());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::file_storage::{ErrorKind, FileMetadata, LocalFileService, StorageResult};
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Reports every object as present but drops the connection mid-body
    #[derive(Debug)]
    struct Interrupted;

    impl FileService for Interrupted {
        fn upload_file(&self, _: &Path, remote: &str, bucket: &str) -> StorageResult<FileMetadata> {
            Ok(FileMetadata::found(bucket, remote, 10, Utc::now(), "mem://".to_string()))
        }

        fn download_file(
            &self,
            _remote: &str,
            sink: &mut (dyn Write + Send),
            _bucket: &str,
        ) -> StorageResult<u64> {
            sink.write_all(b"half")?;
            Err(StorageError::transport("connection reset"))
        }

        fn get_file_metadata(&self, remote: &str, bucket: &str) -> StorageResult<FileMetadata> {
            self.upload_file(Path::new(""), remote, bucket)
        }
    }

    fn setup() -> (LocalFileService, StorageConfig, TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let service = LocalFileService::new(temp.path().join("root")).unwrap();
        let mut config = StorageConfig::default();
        config.default_bucket = Some("myBucket".to_string());
        let source = temp.path().join("test_file.ignore.txt");
        std::fs::write(&source, b"payload").unwrap();
        (service, config, temp, source)
    }

    #[test]
    fn test_upload_then_metadata() {
        let (service, config, _temp, source) = setup();

        let uploaded = execute(
            &service,
            &config,
            Command::Upload {
                local_path: source,
                location: "Test".to_string(),
                bucket: None,
            },
        )
        .unwrap();
        assert_eq!(uploaded["name"], "Test/test_file.ignore.txt");
        assert_eq!(uploaded["bucket"], "myBucket");

        let meta = execute(
            &service,
            &config,
            Command::Metadata {
                remote_path: "Test/test_file.ignore.txt".to_string(),
                bucket: None,
            },
        )
        .unwrap();
        assert_eq!(meta["exists"], true);
        assert_eq!(meta["size"], 7);
    }

    #[test]
    fn test_download_writes_destination() {
        let (service, _config, temp, source) = setup();
        upload(&service, &source, "", "myBucket").unwrap();

        let dest = temp.path().join("test_file.ignore.myBucket.txt");
        let result = download(&service, "test_file.ignore.txt", &dest, "myBucket").unwrap();

        assert_eq!(result["bytes"], 7);
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_download_missing_leaves_no_file() {
        let (service, _config, temp, _source) = setup();
        let dest = temp.path().join("out.txt");

        let err = download(&service, "missing.txt", &dest, "myBucket").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::Storage(ErrorKind::NotFound));
        assert!(!dest.exists());
    }

    #[test]
    fn test_interrupted_download_removes_destination() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("partial.txt");

        let err = download(&Interrupted, "big.txt", &dest, "myBucket").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::Storage(ErrorKind::Transport));
        assert!(!dest.exists());
    }

    #[test]
    fn test_missing_bucket() {
        let (service, mut config, _temp, _source) = setup();
        config.default_bucket = None;

        let err = execute(
            &service,
            &config,
            Command::Metadata {
                remote_path: "a.txt".to_string(),
                bucket: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::MissingBucket);
    }
}
