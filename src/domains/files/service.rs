//! File store service implementation.
//!
//! The FileStore bundles a set of [`FileOptions`] with a shared
//! [`LockRegistry`]. Every mutation it performs runs under the target path's
//! lock, so concurrent workers updating the same file serialize while
//! workers on different files proceed in parallel. Reads are not locked;
//! wrap them in [`FileStore::with_lock`] when read/write isolation matters.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::error::FileResult;
use super::lines::{modify_lines_with_options, read_lines_with_options, write_lines_with_options};
use super::operations::{
    append_to_file, copy_file_with_options, read_file_string_with_options, read_file_with_options,
    write_file_with_options,
};
use super::options::FileOptions;
use crate::core::config::Config;
use crate::core::security::{PathSecurityError, join_and_validate_path};
use crate::domains::locks::LockRegistry;

/// Sandboxed, lock-aware access to files.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Options applied to every operation.
    options: FileOptions,

    /// Registry shared with every other component that mutates files.
    locks: Arc<LockRegistry>,
}

impl FileStore {
    /// Create a new FileStore with the given options and lock registry.
    pub fn new(options: FileOptions, locks: Arc<LockRegistry>) -> Self {
        match options.validation_base() {
            Some(base) => info!("Initializing FileStore sandboxed to {:?}", base),
            None => info!("Initializing FileStore without path validation"),
        }
        Self { options, locks }
    }

    /// Create a FileStore from the security and storage configuration.
    pub fn from_config(config: &Config, locks: Arc<LockRegistry>) -> Self {
        Self::new(config.file_options(), locks)
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    pub fn locks(&self) -> &Arc<LockRegistry> {
        &self.locks
    }

    /// Validate `path` against the store's sandbox root, if any.
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<(), PathSecurityError> {
        self.options.validate(path.as_ref())
    }

    /// Resolve path segments relative to the sandbox root.
    ///
    /// Without a sandbox root the segments are simply joined.
    pub fn resolve<I, P>(&self, elements: I) -> Result<PathBuf, PathSecurityError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        match self.options.validation_base() {
            Some(base) => Ok(base.join(join_and_validate_path(base, elements)?)),
            None => Ok(elements.into_iter().collect()),
        }
    }

    pub fn read(&self, path: impl AsRef<Path>) -> FileResult<Vec<u8>> {
        read_file_with_options(path, &self.options)
    }

    pub fn read_string(&self, path: impl AsRef<Path>) -> FileResult<String> {
        read_file_string_with_options(path, &self.options)
    }

    pub fn read_lines(&self, path: impl AsRef<Path>) -> FileResult<Vec<String>> {
        read_lines_with_options(path, &self.options)
    }

    /// Atomically write `data` to `path` under its lock.
    pub fn write(&self, path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> FileResult<()> {
        let path = path.as_ref();
        self.locks
            .with_file_lock(path, || write_file_with_options(path, data, &self.options))
    }

    pub fn write_string(&self, path: impl AsRef<Path>, content: &str) -> FileResult<()> {
        self.write(path, content)
    }

    pub fn write_lines<S: AsRef<str>>(&self, path: impl AsRef<Path>, lines: &[S]) -> FileResult<()> {
        let path = path.as_ref();
        self.locks
            .with_file_lock(path, || write_lines_with_options(path, lines, &self.options))
    }

    /// Read, transform and rewrite `path` as one critical section.
    pub fn modify_lines<F>(&self, path: impl AsRef<Path>, transform: F) -> FileResult<()>
    where
        F: FnMut(&str, usize) -> String,
    {
        let path = path.as_ref();
        self.locks.with_file_lock(path, || {
            modify_lines_with_options(path, &self.options, transform)
        })
    }

    /// Append under the path's lock, after validating against the sandbox.
    ///
    /// The append itself is still not atomic.
    pub fn append(&self, path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> FileResult<()> {
        let path = path.as_ref();
        self.validate(path)?;
        self.locks.with_file_lock(path, || append_to_file(path, data))
    }

    /// Copy `src` to `dst` under the destination's lock.
    pub fn copy(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>) -> FileResult<()> {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        self.locks
            .with_file_lock(dst, || copy_file_with_options(src, dst, &self.options))
    }

    /// Run `f` while holding the lock for `path`.
    pub fn with_lock<T>(&self, path: impl AsRef<Path>, f: impl FnOnce() -> T) -> T {
        self.locks.with_file_lock(path, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn sandboxed(dir: &Path) -> FileStore {
        FileStore::new(FileOptions::with_base_dir(dir), Arc::new(LockRegistry::new()))
    }

    #[test]
    fn test_write_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = sandboxed(temp_dir.path());
        let path = temp_dir.path().join(".github/workflows/ci.yml");

        store.write_string(&path, "name: CI\n").unwrap();
        assert_eq!(store.read_string(&path).unwrap(), "name: CI\n");
        assert_eq!(store.read(&path).unwrap(), b"name: CI\n");
        assert_eq!(store.read_lines(&path).unwrap(), vec!["name: CI"]);
        assert!(!store.locks().get_lock(&path).is_locked());
    }

    #[test]
    fn test_rejects_outside_sandbox() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("repo");
        fs::create_dir(&base).unwrap();
        let store = sandboxed(&base);

        let outside = temp_dir.path().join("outside.txt");
        assert!(store.write(&outside, "x").unwrap_err().is_validation());
        assert!(store.append(&outside, "x").unwrap_err().is_validation());
        assert!(!outside.exists());
    }

    #[test]
    fn test_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let store = sandboxed(temp_dir.path());

        let path = store.resolve([".github", "workflows", "ci.yml"]).unwrap();
        assert_eq!(path, temp_dir.path().join(".github/workflows/ci.yml"));
        assert!(store.resolve(["..", "escape"]).is_err());

        let open = FileStore::new(FileOptions::default(), Arc::new(LockRegistry::new()));
        assert_eq!(open.resolve(["a", "b"]).unwrap(), PathBuf::from("a/b"));
    }

    #[test]
    fn test_lines_and_copy() {
        let temp_dir = TempDir::new().unwrap();
        let store = sandboxed(temp_dir.path());
        let path = temp_dir.path().join("deps.txt");

        store.write_lines(&path, &["a@v1", "b@v2"]).unwrap();
        store
            .modify_lines(&path, |line, _| line.replace("@v1", "@v9"))
            .unwrap();
        assert_eq!(store.read_string(&path).unwrap(), "a@v9\nb@v2\n");

        let backup = temp_dir.path().join("backup/deps.txt");
        store.copy(&path, &backup).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "a@v9\nb@v2\n");

        store.append(&path, "c@v3\n").unwrap();
        assert_eq!(store.read_lines(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_concurrent_modify_lines_no_lost_updates() {
        const WORKERS: usize = 8;
        let temp_dir = TempDir::new().unwrap();
        let store = sandboxed(temp_dir.path());
        let path = temp_dir.path().join("counter.txt");
        store.write_string(&path, "0\n").unwrap();

        thread::scope(|s| {
            for _ in 0..WORKERS {
                s.spawn(|| {
                    store
                        .modify_lines(&path, |line, _| {
                            let n: usize = line.parse().unwrap();
                            (n + 1).to_string()
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(store.read_string(&path).unwrap(), format!("{WORKERS}\n"));
    }
}
