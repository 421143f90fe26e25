//! Storage the resolver reads fragments from.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A place fragment text can be read from.
///
/// The resolver caches by the key [`FragmentSource::resolve`] returns, so two
/// relative paths naming the same file must resolve to the same key.
pub trait FragmentSource {
    /// Resolve a relative fragment path to its cache key.
    fn resolve(&self, relative: &str) -> PathBuf;

    /// Read the full text stored under a resolved key.
    fn read(&self, resolved: &Path) -> io::Result<String>;
}

/// Reads fragments from the file system below a root directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FragmentSource for FsSource {
    /// Canonicalizes the joined path when the file exists. A path that cannot
    /// be canonicalized is returned as joined, so the read that follows
    /// reports it.
    fn resolve(&self, relative: &str) -> PathBuf {
        let joined = self.root.join(relative);
        fs::canonicalize(&joined).unwrap_or(joined)
    }

    fn read(&self, resolved: &Path) -> io::Result<String> {
        fs::read_to_string(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn equivalent_paths_share_a_key() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("partials")).unwrap();
        fs::write(temp.path().join("partials/nav.html"), "<nav></nav>").unwrap();

        let source = FsSource::new(temp.path());

        assert_eq!(
            source.resolve("partials/nav.html"),
            source.resolve("partials/../partials/./nav.html")
        );
    }

    #[test]
    fn missing_paths_resolve_below_root() {
        let temp = tempdir().unwrap();
        let source = FsSource::new(temp.path());

        let resolved = source.resolve("nope.html");

        assert_eq!(resolved, temp.path().join("nope.html"));
        assert!(source.read(&resolved).is_err());
    }
}
