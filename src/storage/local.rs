//! Local filesystem object store

use crate::error::{StorageError, StorageResult};
use crate::storage::{ObjectFileWriter, ObjectStore};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Object store rooted at a local directory.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`, creating the directory if missing.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::CreateFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { root })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn walk_recursive(
        &self,
        dir: &Path,
        prefix: &str,
        skip_subdirs: bool,
        callback: &mut dyn FnMut(&str, u64) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let entries = fs::read_dir(dir).map_err(|e| StorageError::WalkFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::WalkFailed {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            let file_type = entry.file_type().map_err(|e| StorageError::WalkFailed {
                path: entry.path().display().to_string(),
                reason: e.to_string(),
            })?;

            if file_type.is_dir() {
                if !skip_subdirs {
                    self.walk_recursive(&entry.path(), &rel, skip_subdirs, callback)?;
                }
                continue;
            }

            let size = entry
                .metadata()
                .map(|m| m.len())
                .map_err(|e| StorageError::WalkFailed {
                    path: entry.path().display().to_string(),
                    reason: e.to_string(),
                })?;
            callback(&rel, size)?;
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn create(&self, path: &str) -> StorageResult<Box<dyn ObjectFileWriter>> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::CreateFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        }
        let file = File::create(&full).map_err(|e| StorageError::CreateFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Box::new(LocalFileWriter {
            path: path.to_string(),
            writer: Some(BufWriter::new(file)),
        }))
    }

    fn walk_dir(
        &self,
        skip_subdirs: bool,
        callback: &mut dyn FnMut(&str, u64) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let root = self.root.clone();
        self.walk_recursive(&root, "", skip_subdirs, callback)
    }

    fn delete_file(&self, path: &str) -> StorageResult<()> {
        fs::remove_file(self.resolve(path)).map_err(|e| StorageError::DeleteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Buffered writer for one local file.
struct LocalFileWriter {
    path: String,
    writer: Option<BufWriter<File>>,
}

impl ObjectFileWriter for LocalFileWriter {
    fn write(&mut self, data: &[u8]) -> StorageResult<usize> {
        let writer = self.writer.as_mut().ok_or_else(|| StorageError::WriteFailed {
            path: self.path.clone(),
            reason: "writer already closed".to_string(),
        })?;
        writer.write(data).map_err(|e| StorageError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn close(&mut self) -> StorageResult<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush().map_err(|e| StorageError::CloseFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

impl Drop for LocalFileWriter {
    fn drop(&mut self) {
        // Best effort: close() on all exit paths is the contract, but a
        // panic unwinding through a worker must still flush what it can.
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_write_close() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        let mut writer = store.create("a/b/test.csv").unwrap();
        writer.write_all(b"hello,").unwrap();
        writer.write_all(b"world\n").unwrap();
        writer.close().unwrap();

        let content = std::fs::read_to_string(dir.path().join("a/b/test.csv")).unwrap();
        assert_eq!(content, "hello,world\n");
    }

    #[test]
    fn test_walk_dir_sizes_and_subdirs() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        let mut w = store.create("top.csv").unwrap();
        w.write_all(b"1234").unwrap();
        w.close().unwrap();
        let mut w = store.create("part00001/nested.csv").unwrap();
        w.write_all(b"12").unwrap();
        w.close().unwrap();

        let mut all = Vec::new();
        store
            .walk_dir(false, &mut |path, size| {
                all.push((path.to_string(), size));
                Ok(())
            })
            .unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                ("part00001/nested.csv".to_string(), 2),
                ("top.csv".to_string(), 4)
            ]
        );

        let mut top_only = Vec::new();
        store
            .walk_dir(true, &mut |path, _| {
                top_only.push(path.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(top_only, vec!["top.csv".to_string()]);
    }

    #[test]
    fn test_delete_file() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        let mut w = store.create("x.csv").unwrap();
        w.write_all(b"x").unwrap();
        w.close().unwrap();

        store.delete_file("x.csv").unwrap();
        assert!(!dir.path().join("x.csv").exists());
        assert!(store.delete_file("x.csv").is_err());
    }

    #[test]
    fn test_concurrent_create_distinct_names() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        std::thread::scope(|s| {
            for i in 0..8 {
                let store = &store;
                s.spawn(move || {
                    let mut w = store.create(&format!("f{i}.csv")).unwrap();
                    w.write_all(b"data").unwrap();
                    w.close().unwrap();
                });
            }
        });

        let mut count = 0;
        store
            .walk_dir(true, &mut |_, _| {
                count += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 8);
    }
}
