//! Filesystem scanning helpers for indexing passes.

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::{ParseOptions, SOURCE_EXTENSION};
use crate::errors::{CodemapError, CodemapResult};

const IMPLICIT_IGNORED_DIRS: &[&str] = &[".git"];

const TEST_DIR_SEGMENTS: &[&str] = &["test", "tests"];

/// A source file eligible for indexing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Path as produced by the walk (root-joined, not canonicalized).
    pub path: PathBuf,
    /// Canonical absolute path, used to derive the module name.
    pub absolute_path: PathBuf,
    /// Path relative to the repository root, with `/` separators.
    pub relative_path: String,
    pub size_bytes: u64,
}

/// Walk `root` and return every non-empty, non-test source file, sorted by
/// relative path.
pub fn discover(root: &Path, options: &ParseOptions) -> CodemapResult<Vec<FileDescriptor>> {
    let canonical_root = std::fs::canonicalize(root).map_err(|e| CodemapError::Discovery {
        root: root.to_path_buf(),
        message: e.to_string(),
    })?;
    if !canonical_root.is_dir() {
        return Err(CodemapError::Discovery {
            root: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let respect = options.respect_ignore_files;
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .ignore(respect)
        .git_ignore(respect)
        .git_exclude(respect)
        .git_global(respect)
        .parents(respect)
        .require_git(false)
        .follow_links(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            !(is_dir
                && IMPLICIT_IGNORED_DIRS
                    .iter()
                    .any(|d| entry.file_name() == std::ffi::OsStr::new(d)))
        });

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        if !has_source_extension(path) {
            continue;
        }
        let relative = match path.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        if is_test_file(&relative) {
            continue;
        }
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if size_bytes == 0 {
            continue;
        }
        let absolute_path = std::fs::canonicalize(path).unwrap_or_else(|_| canonical_root.join(&relative));
        files.push(FileDescriptor {
            path: path.to_path_buf(),
            absolute_path,
            relative_path: to_posix(&relative),
            size_bytes,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy() == SOURCE_EXTENSION)
        .unwrap_or(false)
}

/// True when a repository-relative path names a test file: any directory
/// segment equal to `test`/`tests` (any case), or a stem of the form
/// `test_*`, `*_test`, `tests_*`, `*_tests`.
pub fn is_test_file(relative_path: &Path) -> bool {
    let parent_segments = relative_path
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(os) => Some(os.to_string_lossy().to_lowercase()),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if parent_segments
        .iter()
        .any(|segment| TEST_DIR_SEGMENTS.contains(&segment.as_str()))
    {
        return true;
    }

    let stem = relative_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.starts_with("tests_")
        || stem.ends_with("_tests")
}

pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(os) => Some(os.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// SHA-256 hex digest of file contents.
pub fn compute_content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_is_test_file_names() {
        assert!(is_test_file(Path::new("test_api.py")));
        assert!(is_test_file(Path::new("api_test.py")));
        assert!(is_test_file(Path::new("tests_api.py")));
        assert!(is_test_file(Path::new("api_tests.py")));
        assert!(!is_test_file(Path::new("testing.py")));
        assert!(!is_test_file(Path::new("contest.py")));
        assert!(!is_test_file(Path::new("api.py")));
    }

    #[test]
    fn test_is_test_file_directories() {
        assert!(is_test_file(Path::new("tests/helpers.py")));
        assert!(is_test_file(Path::new("pkg/Test/helpers.py")));
        assert!(is_test_file(Path::new("pkg/TESTS/sub/helpers.py")));
        assert!(!is_test_file(Path::new("pkg/testing/helpers.py")));
        assert!(!is_test_file(Path::new("tests.py")));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "b.py", "x = 1\n");
        write(root, "a.py", "def f():\n    pass\n");
        write(root, "pkg/mod.py", "y = 2\n");
        write(root, "pkg/empty.py", "");
        write(root, "pkg/test_mod.py", "z = 3\n");
        write(root, "tests/conftest.py", "w = 4\n");
        write(root, "README.md", "# readme\n");
        write(root, ".git/hooks/hook.py", "v = 5\n");

        let files = discover(root, &ParseOptions::default()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["a.py", "b.py", "pkg/mod.py"]);
        assert!(files.iter().all(|f| f.absolute_path.is_absolute()));
        assert!(files.iter().all(|f| f.size_bytes > 0));
    }

    #[test]
    fn test_discover_respects_gitignore_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, ".gitignore", "build/\n");
        write(root, "build/gen.py", "x = 1\n");
        write(root, "src.py", "y = 1\n");

        let all = discover(root, &ParseOptions::default()).unwrap();
        assert_eq!(all.len(), 2);

        let options = ParseOptions::default().with_respect_ignore_files(true);
        let filtered = discover(root, &options).unwrap();
        let rels: Vec<&str> = filtered.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["src.py"]);
    }

    #[test]
    fn test_discover_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = discover(&missing, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, CodemapError::Discovery { .. }));
    }

    #[test]
    fn test_compute_content_hash() {
        assert_eq!(
            compute_content_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
