//! # Object Storage
//!
//! Survey inputs are read from, and rendered profiles written to, a bucket
//! addressed by `/`-separated object keys such as
//! `outputs/images/profile_survey.csv_1_1.5.png`.
//!
//! [`ObjectStore`] is the seam the service talks to. [`DirectoryStore`] backs
//! a bucket with a plain directory (`<root>/<bucket>/<key>`), which is what
//! the CLI uses and what the tests run against.
//!
//! ## Key Rules
//! - keys are relative: no leading `/`, no backslashes
//! - no empty, `.` or `..` segments, so a key can never escape its bucket

use crate::config::StorageConfig;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("storage IO on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Bucket operations needed by the profile service.
pub trait ObjectStore {
    /// Copy a local file into the bucket and return its URL.
    fn upload_file(&self, local_path: &Path, key: &str) -> Result<String, StorageError>;

    /// Write an in-memory object.
    fn upload_bytes(&self, data: &[u8], key: &str, content_type: &str) -> Result<(), StorageError>;

    /// Copy an object out of the bucket to a local file.
    fn download_file(&self, key: &str, destination: &Path) -> Result<(), StorageError>;

    /// URL of an object, empty when none can be produced.
    fn file_url(&self, key: &str) -> String;

    /// Keys starting with `prefix`, sorted.
    fn list_files(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError>;

    fn delete_file(&self, key: &str) -> Result<(), StorageError>;

    fn file_exists(&self, key: &str) -> bool;
}

/// Bucket stored as a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    bucket: String,
    bucket_dir: PathBuf,
}

impl DirectoryStore {
    /// Open the bucket described by `config`, creating it if it doesn't exist.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let bucket_dir = config.root.join(&config.bucket);
        if !bucket_dir.is_dir() {
            fs::create_dir_all(&bucket_dir).map_err(|source| StorageError::Io {
                key: config.bucket.clone(),
                source,
            })?;
            debug!(bucket = %config.bucket, path = %bucket_dir.display(), "created bucket");
        }
        Ok(Self {
            bucket: config.bucket.clone(),
            bucket_dir,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Filesystem path of an object, after validating the key.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('/')
            && !key.contains('\\')
            && key
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir.join(key))
    }

    fn io_error(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            key: key.to_string(),
            source,
        }
    }

    fn ensure_parent(path: &Path, key: &str) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Self::io_error(key))?;
        }
        Ok(())
    }

    fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let key = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if entry.file_type()?.is_dir() {
                Self::collect_keys(&entry.path(), &key, keys)?;
            } else {
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for DirectoryStore {
    fn upload_file(&self, local_path: &Path, key: &str) -> Result<String, StorageError> {
        let target = self.resolve(key)?;
        Self::ensure_parent(&target, key)?;
        fs::copy(local_path, &target).map_err(Self::io_error(key))?;
        debug!(bucket = %self.bucket, key, "uploaded file");
        Ok(self.file_url(key))
    }

    fn upload_bytes(&self, data: &[u8], key: &str, content_type: &str) -> Result<(), StorageError> {
        let target = self.resolve(key)?;
        Self::ensure_parent(&target, key)?;
        fs::write(&target, data).map_err(Self::io_error(key))?;
        debug!(bucket = %self.bucket, key, content_type, bytes = data.len(), "uploaded object");
        Ok(())
    }

    fn download_file(&self, key: &str, destination: &Path) -> Result<(), StorageError> {
        let source = self.resolve(key)?;
        if !source.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Self::ensure_parent(destination, key)?;
        fs::copy(&source, destination).map_err(Self::io_error(key))?;
        debug!(bucket = %self.bucket, key, destination = %destination.display(), "downloaded object");
        Ok(())
    }

    fn file_url(&self, key: &str) -> String {
        match self.resolve(key) {
            Ok(path) => {
                let absolute = fs::canonicalize(&path).unwrap_or(path);
                format!("file://{}", absolute.display())
            }
            Err(_) => String::new(),
        }
    }

    fn list_files(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        Self::collect_keys(&self.bucket_dir, "", &mut keys).map_err(Self::io_error(&self.bucket))?;

        let prefix = prefix.unwrap_or("");
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn delete_file(&self, key: &str) -> Result<(), StorageError> {
        let target = self.resolve(key)?;
        if !target.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        fs::remove_file(&target).map_err(Self::io_error(key))?;
        debug!(bucket = %self.bucket, key, "deleted object");
        Ok(())
    }

    fn file_exists(&self, key: &str) -> bool {
        self.resolve(key).map(|path| path.is_file()).unwrap_or(false)
    }
}
