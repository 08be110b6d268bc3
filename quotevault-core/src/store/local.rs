//! Filesystem backend: `{root}/{bucket}/{key}`.
//!
//! Stands in for S3 on dry runs and local development. Keys may contain `/`;
//! intermediate directories are created on write.

use super::{ObjectStore, StoreError};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Resolve a key under the bucket, refusing anything that would escape it.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(key);
        if key.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StoreError::Request(format!("invalid object key '{key}'")));
        }
        Ok(self.bucket_dir(bucket).join(rel))
    }
}

impl ObjectStore for LocalStore {
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let dir = self.bucket_dir(bucket);
        match std::fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Request(format!(
                "{} exists but is not a directory",
                dir.display()
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
            }),
            Err(e) => Err(StoreError::Request(format!("{}: {e}", dir.display()))),
        }
    }

    fn create_bucket(&self, bucket: &str, _region: &str) -> Result<(), StoreError> {
        let dir = self.bucket_dir(bucket);
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Request(format!("{}: {e}", dir.display())))
    }

    fn put_object(&self, bucket: &str, key: &str, body: &Path) -> Result<(), StoreError> {
        if !self.bucket_dir(bucket).is_dir() {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
            });
        }
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Request(format!("{}: {e}", parent.display())))?;
        }
        let mut src = File::open(body).map_err(|source| StoreError::LocalFile {
            path: body.to_path_buf(),
            source,
        })?;
        let dest_err = |e: std::io::Error| StoreError::Request(format!("{}: {e}", path.display()));
        let mut dest = File::create(&path).map_err(dest_err)?;
        std::io::copy(&mut src, &mut dest).map_err(dest_err)?;
        Ok(())
    }
}
