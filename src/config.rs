//! Storage configuration.
//!
//! Settings are layered, later layers winning:
//! 1. the base JSON file (`cloudstore.json` by default)
//! 2. an optional environment overlay next to it, `cloudstore.{env}.json`,
//!    where `env` comes from `CLOUDSTORE_ENVIRONMENT`
//! 3. `CLOUDSTORE_*` environment variables
//!
//! `log_filter` is only read by the CLI when it installs logging.
//!
//! The storage core never reads configuration; only the factory does.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::file_storage::{S3Settings, UploadPolicy};

/// Environment variable selecting the overlay file
pub const ENVIRONMENT_VAR: &str = "CLOUDSTORE_ENVIRONMENT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file `{}` does not exist", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read config `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which backend the factory builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Filesystem emulation
    #[default]
    Local,
    /// S3-compatible object store
    S3,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::S3 => "s3",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            other => Err(ConfigError::invalid(
                "backend",
                format!("unknown backend `{}`, expected `local` or `s3`", other),
            )),
        }
    }
}

/// Filesystem backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Directory holding one sub-directory per bucket
    #[serde(default = "default_local_root")]
    pub root: PathBuf,
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./storage")
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            root: default_local_root(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to construct (default "local")
    #[serde(default)]
    pub backend: BackendKind,

    /// Bucket used when a command does not name one
    #[serde(default)]
    pub default_bucket: Option<String>,

    #[serde(default)]
    pub local: LocalSettings,

    #[serde(default)]
    pub s3: S3Settings,

    /// Upload validation rules, shared by every backend
    #[serde(default)]
    pub upload: UploadPolicy,

    /// `tracing` filter directives for the CLI, e.g. `cloudstore=debug`
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl StorageConfig {
    /// Load configuration from `path`, the process environment overlay and
    /// `CLOUDSTORE_*` variables
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let environment = std::env::var(ENVIRONMENT_VAR).ok();
        Self::load_with(path, environment.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment name and variable lookup
    pub fn load_with<F>(path: &Path, environment: Option<&str>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !path.is_file() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let mut merged = read_json(path)?;

        if let Some(env) = environment.filter(|e| !e.is_empty()) {
            let overlay = overlay_path(path, env);
            if overlay.is_file() {
                merge(&mut merged, read_json(&overlay)?);
            }
        }

        let mut config: StorageConfig =
            serde_json::from_value(merged).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.apply_env(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Apply `CLOUDSTORE_*` overrides
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("CLOUDSTORE_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(bucket) = lookup("CLOUDSTORE_DEFAULT_BUCKET") {
            self.default_bucket = Some(bucket);
        }
        if let Some(root) = lookup("CLOUDSTORE_LOCAL_ROOT") {
            self.local.root = PathBuf::from(root);
        }
        if let Some(region) = lookup("CLOUDSTORE_S3_REGION") {
            self.s3.region = region;
        }
        if let Some(endpoint) = lookup("CLOUDSTORE_S3_ENDPOINT") {
            self.s3.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("CLOUDSTORE_S3_ACCESS_KEY") {
            self.s3.access_key = Some(key);
        }
        if let Some(secret) = lookup("CLOUDSTORE_S3_SECRET_KEY") {
            self.s3.secret_key = Some(secret);
        }
        if let Some(filter) = lookup("CLOUDSTORE_LOG_FILTER") {
            self.log_filter = Some(filter);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(bucket) = &self.default_bucket {
            crate::file_storage::path::validate_bucket(bucket)
                .map_err(|e| ConfigError::invalid("default_bucket", e.to_string()))?;
        }

        if let Some(filter) = &self.log_filter {
            EnvFilter::try_new(filter).map_err(|e| ConfigError::invalid("log_filter", e.to_string()))?;
        }

        match self.backend {
            BackendKind::Local => {
                if self.local.root.as_os_str().is_empty() {
                    return Err(ConfigError::invalid("local.root", "must not be empty"));
                }
            }
            BackendKind::S3 => {
                if self.s3.region.is_empty() {
                    return Err(ConfigError::invalid("s3.region", "must not be empty"));
                }
                if self.s3.access_key.is_some() != self.s3.secret_key.is_some() {
                    return Err(ConfigError::invalid(
                        "s3.access_key",
                        "access_key and secret_key must be set together",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn read_json(path: &Path) -> ConfigResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `dir/cloudstore.json` + `dev` -> `dir/cloudstore.dev.json`
fn overlay_path(path: &Path, environment: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("cloudstore");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}.{}", stem, environment, ext),
        None => format!("{}.{}", stem, environment),
    };
    path.with_file_name(name)
}

/// Merge `overlay` into `base`; objects merge key by key, anything else replaces
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cloudstore.json", json!({}));

        let config = StorageConfig::load_with(&path, None, no_env).unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.local.root, PathBuf::from("./storage"));
        assert_eq!(config.s3.presign_expiry_secs, 3600);
        assert_eq!(config.upload, UploadPolicy::default());
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = StorageConfig::load_with(&temp.path().join("nope.json"), None, no_env);
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cloudstore.json");
        fs::write(&path, "{ not json").unwrap();

        let result = StorageConfig::load_with(&path, None, no_env);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_environment_overlay() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "cloudstore.json",
            json!({
                "backend": "local",
                "local": { "root": "/srv/base" },
                "upload": { "allowed_extensions": ["txt"], "max_file_size": 10 }
            }),
        );
        write(
            temp.path(),
            "cloudstore.staging.json",
            json!({ "upload": { "max_file_size": 20 } }),
        );

        let config = StorageConfig::load_with(&path, Some("staging"), no_env).unwrap();
        assert_eq!(config.local.root, PathBuf::from("/srv/base"));
        assert_eq!(config.upload.allowed_extensions, vec!["txt".to_string()]);
        assert_eq!(config.upload.max_file_size, 20);
    }

    #[test]
    fn test_missing_overlay_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cloudstore.json", json!({ "default_bucket": "myBucket" }));

        let config = StorageConfig::load_with(&path, Some("production"), no_env).unwrap();
        assert_eq!(config.default_bucket.as_deref(), Some("myBucket"));
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cloudstore.json", json!({ "backend": "local" }));

        let vars: HashMap<&str, &str> = [
            ("CLOUDSTORE_BACKEND", "S3"),
            ("CLOUDSTORE_S3_ENDPOINT", "http://localhost:9000"),
            ("CLOUDSTORE_S3_ACCESS_KEY", "minio"),
            ("CLOUDSTORE_S3_SECRET_KEY", "minio123"),
        ]
        .into_iter()
        .collect();

        let config =
            StorageConfig::load_with(&path, None, |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.backend, BackendKind::S3);
        assert_eq!(config.s3.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.s3.access_key.as_deref(), Some("minio"));
    }

    #[test]
    fn test_validation() {
        let mut config = StorageConfig::default();
        config.default_bucket = Some("a/b".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "default_bucket", .. })
        ));

        let mut config = StorageConfig::default();
        config.backend = BackendKind::S3;
        config.s3.access_key = Some("key".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_filter() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cloudstore.json", json!({ "log_filter": "cloudstore=debug" }));

        let config = StorageConfig::load_with(&path, None, no_env).unwrap();
        assert_eq!(config.log_filter.as_deref(), Some("cloudstore=debug"));

        let config = StorageConfig::load_with(&path, None, |k| {
            (k == "CLOUDSTORE_LOG_FILTER").then(|| "warn".to_string())
        })
        .unwrap();
        assert_eq!(config.log_filter.as_deref(), Some("warn"));

        let bad = write(temp.path(), "bad.json", json!({ "log_filter": "cloudstore=loud" }));
        assert!(matches!(
            StorageConfig::load_with(&bad, None, no_env),
            Err(ConfigError::Invalid { field: "log_filter", .. })
        ));
    }

    #[test]
    fn test_unknown_backend() {
        assert!("gcs".parse::<BackendKind>().is_err());
        assert_eq!("LOCAL".parse::<BackendKind>().unwrap(), BackendKind::Local);
    }

    #[test]
    fn test_overlay_path() {
        assert_eq!(
            overlay_path(Path::new("/etc/cloudstore.json"), "dev"),
            PathBuf::from("/etc/cloudstore.dev.json")
        );
    }
}
