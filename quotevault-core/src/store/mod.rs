//! Object store seam, bucket initialization and upload.
//!
//! The ObjectStore trait abstracts over the remote store (S3) and the
//! local-directory backend used for dry runs. Every call is blocking and
//! happens exactly once; nothing here retries.

pub mod local;
pub mod s3;

use crate::config::StorageLocation;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use local::LocalStore;
pub use s3::S3Store;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The bucket does not exist. Only `head_bucket` is expected to report this.
    #[error("bucket '{bucket}' not found")]
    NotFound { bucket: String },

    #[error("access denied to bucket '{bucket}': {message}")]
    AccessDenied { bucket: String, message: String },

    #[error("object store request failed: {0}")]
    Request(String),

    #[error("failed to read {path}: {source}")]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Blocking object store operations used by the job.
pub trait ObjectStore {
    /// Succeed if the bucket exists and is reachable, `StoreError::NotFound`
    /// if it does not exist, any other error otherwise.
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Create a bucket in `region`.
    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError>;

    /// Stream the file at `body` to `key`, replacing any existing object.
    ///
    /// A file that cannot be opened is `StoreError::LocalFile`.
    fn put_object(&self, bucket: &str, key: &str, body: &Path) -> Result<(), StoreError>;
}

/// Make sure the destination bucket exists, creating it on a not-found.
///
/// Idempotent. Any failure other than not-found is returned unchanged.
pub fn ensure_bucket_exists(
    store: &dyn ObjectStore,
    bucket: &str,
    region: &str,
) -> Result<(), StoreError> {
    match store.head_bucket(bucket) {
        Ok(()) => {
            tracing::info!("Bucket '{bucket}' already exists.");
            Ok(())
        }
        Err(StoreError::NotFound { .. }) => {
            tracing::info!("Bucket '{bucket}' does not exist. Creating it...");
            store.create_bucket(bucket, region)?;
            tracing::info!("Bucket '{bucket}' created successfully.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// `{prefix}{file_name}`, no separator inserted.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{prefix}{file_name}")
}

/// Stream `local_path` to `destination` under `{prefix}{file_name}`.
///
/// Returns the key written. Existing objects are silently overwritten.
pub fn upload(
    store: &dyn ObjectStore,
    local_path: &Path,
    file_name: &str,
    destination: &StorageLocation,
) -> Result<String, StoreError> {
    let key = object_key(&destination.prefix, file_name);
    store.put_object(&destination.bucket, &key, local_path)?;

    tracing::info!(
        "File {file_name} uploaded to S3 bucket {} successfully.",
        destination.bucket
    );
    Ok(key)
}
