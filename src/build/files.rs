//! File discovery and safe filesystem moves.
//!
//! Discovery walks a root directory in a stable order (sorted by file
//! name at every level) and keeps the regular files whose path relative
//! to the root matches a glob pattern.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;
use walkdir::WalkDir;

use super::naming::with_collision_suffix;

/// Upper bound for ` (n)` suffix probing.
pub const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum DiscoverError {
    #[error("directory does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: walkdir::Error,
    },
}

// =============================================================================
// Discovery
// =============================================================================

/// Options controlling how a glob pattern matches relative paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobOptions {
    pub case_insensitive: bool,
}

/// Compile a glob where `*` never crosses a `/`.
pub fn compile_glob(pattern: &str, options: GlobOptions) -> Result<GlobMatcher, DiscoverError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(options.case_insensitive)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| DiscoverError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Recursively list the files under `root` matching `pattern`.
///
/// Hidden entries (names starting with `.`) are skipped, and so are entries
/// below the root that cannot be read (dangling symlinks, unreadable
/// directories, link loops). The returned paths are absolute when `root`
/// is, and come back in walk order.
pub fn discover(
    root: &Path,
    pattern: &str,
    options: GlobOptions,
) -> Result<Vec<PathBuf>, DiscoverError> {
    if !root.exists() {
        return Err(DiscoverError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoverError::NotADirectory(root.to_path_buf()));
    }

    let matcher = compile_glob(pattern, options)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(DiscoverError::ReadDir {
                    path: root.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if matcher.is_match(&rel_str) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

// =============================================================================
// Filesystem helpers
// =============================================================================

/// Whether a path exists. Errors other than "not found" count as existing,
/// so callers never clobber something they could not inspect.
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(true)
}

/// Find a free name for `file_name` inside `dir`.
///
/// Tries `file_name` first, then `stem (2).ext`, `stem (3).ext`, ...
/// A candidate is taken when it exists on disk (and is not `own_path`) or
/// was already claimed earlier in the run.
pub async fn free_target(
    dir: &Path,
    file_name: &str,
    own_path: &Path,
    claimed: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    let first = dir.join(file_name);
    if !is_taken(&first, own_path, claimed).await {
        return Some(first);
    }

    for n in 2..MAX_SUFFIX_ATTEMPTS {
        let candidate = dir.join(with_collision_suffix(file_name, n));
        if !is_taken(&candidate, own_path, claimed).await {
            return Some(candidate);
        }
    }

    None
}

async fn is_taken(candidate: &Path, own_path: &Path, claimed: &HashSet<PathBuf>) -> bool {
    if claimed.contains(candidate) {
        return true;
    }
    candidate != own_path && exists(candidate).await
}

/// Move a file, creating the destination's parent directories.
///
/// Tries an atomic rename first. When the rename fails because source and
/// destination live on different devices, or because of a permission
/// error, falls back to copying the bytes and unlinking the source.
pub async fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::CrossesDevices | ErrorKind::PermissionDenied) => {
            tracing::debug!(
                src = %src.display(),
                dest = %dest.display(),
                error = %e,
                "rename failed, copying instead"
            );
            tokio::fs::copy(src, dest).await?;
            tokio::fs::remove_file(src).await
        }
        Err(e) => Err(e),
    }
}

/// Write a value as pretty-printed JSON, creating parent directories.
pub async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_discover_matches_pattern_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.md"));
        touch(&dir.path().join("a.md"));
        touch(&dir.path().join("sub/c.md"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join(".hidden/d.md"));

        let files = discover(dir.path(), "**/*.md", GlobOptions::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| crate::build::naming::relative_display(p, dir.path()))
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "sub/c.md"]);
    }

    #[test]
    fn test_discover_star_does_not_cross_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.md"));
        touch(&dir.path().join("sub/c.md"));

        let files = discover(dir.path(), "*.md", GlobOptions::default()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discover_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("A.MD"));

        assert!(discover(dir.path(), "**/*.md", GlobOptions::default())
            .unwrap()
            .is_empty());
        let options = GlobOptions {
            case_insensitive: true,
        };
        assert_eq!(discover(dir.path(), "**/*.md", options).unwrap().len(), 1);
    }

    #[test]
    fn test_discover_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            discover(&missing, "**/*.md", GlobOptions::default()),
            Err(DiscoverError::PathNotFound(_))
        ));
        assert!(matches!(
            discover(dir.path(), "**/[.md", GlobOptions::default()),
            Err(DiscoverError::Pattern { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.md"));
        std::os::unix::fs::symlink(dir.path().join("missing.md"), dir.path().join("b.md"))
            .unwrap();

        let files = discover(dir.path(), "**/*.md", GlobOptions::default()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.md")]);
    }

    #[tokio::test]
    async fn test_free_target_tries_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.md"));
        touch(&dir.path().join("a (2).md"));
        let mut claimed = HashSet::new();
        let src = dir.path().join("elsewhere.md");

        let target = free_target(dir.path(), "a.md", &src, &claimed).await.unwrap();
        assert_eq!(target, dir.path().join("a (3).md"));

        claimed.insert(target);
        let target = free_target(dir.path(), "a.md", &src, &claimed).await.unwrap();
        assert_eq!(target, dir.path().join("a (4).md"));

        let target = free_target(dir.path(), "b.md", &src, &claimed).await.unwrap();
        assert_eq!(target, dir.path().join("b.md"));
    }

    #[tokio::test]
    async fn test_free_target_own_path_is_free() {
        let dir = tempfile::tempdir().unwrap();
        let own = dir.path().join("a.md");
        touch(&own);

        let target = free_target(dir.path(), "a.md", &own, &HashSet::new())
            .await
            .unwrap();
        assert_eq!(target, own);
    }

    #[tokio::test]
    async fn test_move_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.md");
        std::fs::write(&src, "hello").unwrap();
        let dest = dir.path().join("out/nested/a.md");

        move_file(&src, &dest).await.unwrap();

        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");
    }
}
