//! Object storage abstraction
//!
//! The generator writes through a narrow interface: [`ObjectStore`] creates
//! append-only [`ObjectFileWriter`]s, lists objects, and deletes them. The
//! local filesystem backend is built in; `s3://` and `gcs://` paths are
//! recognized (and their config sections validated) but their backends are
//! supplied externally through the same traits.

pub mod local;

pub use local::LocalStore;

use crate::config::Config;
use crate::error::{StorageError, StorageResult};

/// Append-only writer for one object.
///
/// `write` may perform partial writes; `close` must flush and finalize the
/// object and is called exactly once on every exit path.
pub trait ObjectFileWriter: Send {
    fn write(&mut self, data: &[u8]) -> StorageResult<usize>;

    fn close(&mut self) -> StorageResult<()>;

    /// Write the whole buffer, looping over partial writes.
    fn write_all(&mut self, mut data: &[u8]) -> StorageResult<()> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                return Err(StorageError::WriteFailed {
                    path: String::new(),
                    reason: "writer made no progress".to_string(),
                });
            }
            data = &data[n..];
        }
        Ok(())
    }
}

/// Minimal object-store surface consumed by the generator.
///
/// `create` must be safe to call concurrently with distinct names.
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Open a new object for writing. Parent folders are created as needed.
    fn create(&self, path: &str) -> StorageResult<Box<dyn ObjectFileWriter>>;

    /// Visit every object under the root with its size. With `skip_subdirs`
    /// only top-level objects are reported.
    fn walk_dir(
        &self,
        skip_subdirs: bool,
        callback: &mut dyn FnMut(&str, u64) -> StorageResult<()>,
    ) -> StorageResult<()>;

    /// Remove one object.
    fn delete_file(&self, path: &str) -> StorageResult<()>;

    /// Release backend resources. The local backend has none to release.
    fn close(&self) {}
}

/// Build the store for the configured path.
pub fn new_store(cfg: &Config) -> StorageResult<Box<dyn ObjectStore>> {
    let path = cfg.common.path.as_str();

    if path.starts_with("s3://") {
        return Err(StorageError::UnsupportedBackend {
            scheme: "s3".to_string(),
        });
    }
    if path.starts_with("gcs://") || path.starts_with("gs://") {
        return Err(StorageError::UnsupportedBackend {
            scheme: "gcs".to_string(),
        });
    }

    Ok(Box::new(LocalStore::new(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_cloud_schemes_report_unsupported() {
        let mut cfg = Config::default();
        cfg.common.path = "s3://bucket/prefix".to_string();
        let err = new_store(&cfg).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedBackend { ref scheme } if scheme == "s3"));

        cfg.common.path = "gcs://bucket/prefix".to_string();
        let err = new_store(&cfg).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedBackend { ref scheme } if scheme == "gcs"));
    }
}
