use std::path::{Path, PathBuf};
use crate::error::DecodeError;
use crate::escape::encode_path;

/// The module download cache, laid out as `<root>/<escaped module>/@v/<escaped version>.<ext>`.
#[derive(Debug, Clone)]
pub struct ModuleCache {
    root: PathBuf,
}

impl ModuleCache {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the cache tree.
    ///
    /// Returns `None` for paths that would step outside the root (`.` or `..`
    /// segments, backslashes, NUL bytes).
    pub fn locate(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in url_path.split('/') {
            match segment {
                "" => continue,
                "." | ".." => return None,
                s if s.contains('\\') || s.contains('\0') => return None,
                s => path.push(s),
            }
        }
        Some(path)
    }

    /// Whether anything (file or directory) exists at the request path.
    pub fn contains(&self, url_path: &str) -> bool {
        self.locate(url_path).is_some_and(|p| p.exists())
    }

    /// Returns the cached file for a request path, if there is a regular file there.
    pub fn file(&self, url_path: &str) -> Option<PathBuf> {
        self.locate(url_path).filter(|p| p.is_file())
    }

    /// Directory holding all cached artifacts of a (decoded) module path.
    pub fn module_dir(&self, module: &str) -> Result<PathBuf, DecodeError> {
        let escaped = encode_path(module)?;
        Ok(self.root.join(escaped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_locate_joins_segments() {
        let cache = ModuleCache::new("/cache");
        assert_eq!(
            cache.locate("/ex.com/m/@v/v1.0.0.info").unwrap(),
            PathBuf::from("/cache/ex.com/m/@v/v1.0.0.info")
        );
    }

    #[test]
    fn test_locate_rejects_traversal() {
        let cache = ModuleCache::new("/cache");
        assert!(cache.locate("/../etc/passwd").is_none());
        assert!(cache.locate("/a/./b").is_none());
        assert!(cache.locate("/a\\..\\b").is_none());
    }

    #[test]
    fn test_contains_and_file() {
        let dir = tempdir().unwrap();
        let cache = ModuleCache::new(dir.path());
        std::fs::create_dir_all(dir.path().join("ex.com/m/@v")).unwrap();
        std::fs::write(dir.path().join("ex.com/m/@v/v1.0.0.mod"), "module ex.com/m\n").unwrap();

        assert!(cache.contains("/ex.com/m/@v/v1.0.0.mod"));
        assert!(cache.contains("/ex.com/m/@v"));
        assert!(!cache.contains("/ex.com/m/@v/v1.0.0.info"));
        assert!(cache.file("/ex.com/m/@v/v1.0.0.mod").is_some());
        assert!(cache.file("/ex.com/m/@v").is_none());
    }

    #[test]
    fn test_module_dir_is_escaped() {
        let cache = ModuleCache::new("/cache");
        assert_eq!(
            cache.module_dir("github.com/Azure/go").unwrap(),
            PathBuf::from("/cache/github.com/!azure/go")
        );
    }
}
