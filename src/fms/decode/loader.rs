//! Where included files come from.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

/// Loads the text of included units.
pub trait SourceLoader {
    /// Reads the unit at `path`.
    ///
    /// # Errors
    ///
    /// Any I/O error; the decoder reports it and skips the include.
    fn load(&self, path: &Path) -> io::Result<String>;

    /// Resolves `path` as written in an `include` against the directory of the including unit.
    fn resolve(&self, base: Option<&Path>, path: &str) -> PathBuf {
        let path = Path::new(path);
        match base {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl<T: SourceLoader + ?Sized> SourceLoader for &T {
    fn load(&self, path: &Path) -> io::Result<String> {
        T::load(self, path)
    }

    fn resolve(&self, base: Option<&Path>, path: &str) -> PathBuf {
        T::resolve(self, base, path)
    }
}

/// Reads units from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves units from memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Creates a loader without files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_to_base() {
        let loader = MemoryLoader::new();
        assert_eq!(
            loader.resolve(Some(Path::new("scores")), "parts/a.fms"),
            PathBuf::from("scores/parts/a.fms")
        );
        assert_eq!(loader.resolve(None, "a.fms"), PathBuf::from("a.fms"));
    }

    #[test]
    fn memory_loader_reports_missing_files() {
        let loader = MemoryLoader::new().with_file("a.fms", "pitch 60;");
        assert_eq!(loader.load(Path::new("a.fms")).unwrap(), "pitch 60;");
        assert_eq!(
            loader.load(Path::new("b.fms")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
