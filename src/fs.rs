//! Filesystem capability used by file-backed sources.
//!
//! Sources only ever go through [`FileSystem`], so tests can run against
//! [`MemoryFileSystem`] instead of the real disk.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Minimal filesystem operations needed to locate and read config files.
pub trait FileSystem: Send + Sync {
    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Read the full contents of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Resolve `path` to an absolute path without touching the disk.
    ///
    /// # Errors
    ///
    /// Fails when the path cannot be resolved, e.g. when it is empty or the
    /// working directory is unavailable.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The operating system's filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }
}

/// Shared handle to the OS filesystem.
pub fn os_filesystem() -> Arc<dyn FileSystem> {
    Arc::new(OsFileSystem)
}

/// In-memory filesystem with a fixed working directory.
///
/// # Examples
///
/// ```rust
/// use priority_config::fs::{FileSystem, MemoryFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new("/srv/app").with_file("/etc/app/app.yaml", "port: 8080");
/// assert!(fs.exists(Path::new("/etc/app/app.yaml")));
/// assert_eq!(fs.absolute(Path::new("conf")).unwrap(), Path::new("/srv/app/conf"));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    cwd: PathBuf,
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem; relative paths resolve against `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: HashMap::new(),
        }
    }

    /// Add a file. Relative paths are resolved against the working directory.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        let path = self.cwd.join(path.as_ref());
        self.files.insert(path, contents.into());
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot make an empty path absolute",
            ));
        }
        Ok(self.cwd.join(path))
    }
}
