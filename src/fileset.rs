//! Source pattern resolution.
//!
//! Expands a plan's glob pattern into the concrete set of regular files it
//! matches. A pattern that matches nothing is an error, never a silent
//! no-op: a backup plan archiving zero files is almost certainly a
//! misconfiguration.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use walkdir::WalkDir;

/// The resolved input of one archiving run: the matched files plus the
/// directory their archive member names are made relative to.
#[derive(Debug, Clone)]
pub struct FileSet {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Directory that archive member names are computed against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Matched regular files, sorted by path.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum FilesetError {
    #[error("invalid source pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("no input files matched pattern `{pattern}`")]
    NoMatch { pattern: String },
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Compiles `pattern` with path-aware glob semantics: `*` and `?` stay
/// within one path component, `**` recurses.
pub fn matcher(pattern: &str) -> Result<GlobMatcher, FilesetError> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| FilesetError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
    Ok(glob.compile_matcher())
}

/// Resolves `pattern` into the ordered set of matching regular files.
///
/// Walks from the pattern's longest glob-free prefix, keeps regular files
/// only, and sorts the result so repeated runs see identical input order.
pub fn resolve(pattern: &str) -> Result<FileSet, FilesetError> {
    let matcher = matcher(pattern)?;
    let walk_root = static_prefix(pattern);

    let mut files = Vec::new();
    if walk_root.exists() {
        for entry in WalkDir::new(&walk_root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().strip_prefix(".").unwrap_or(entry.path());
            if matcher.is_match(path) {
                files.push(path.to_path_buf());
            }
        }
    }
    if files.is_empty() {
        return Err(FilesetError::NoMatch {
            pattern: pattern.to_string(),
        });
    }
    files.sort();

    let root = if walk_root.is_file() {
        walk_root.parent().unwrap_or(Path::new("")).to_path_buf()
    } else {
        walk_root
    };
    Ok(FileSet { root, files })
}

/// Longest leading run of path components free of glob metacharacters.
fn static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[', '{']) {
            break;
        }
        prefix.push(component);
    }
    if prefix.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed(dir: &Path, name: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn matches_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "b.sql");
        seed(dir.path(), "a.sql");
        seed(dir.path(), "notes.txt");

        let pattern = format!("{}/*.sql", dir.path().display());
        let fileset = resolve(&pattern).unwrap();

        assert_eq!(fileset.root(), dir.path());
        assert_eq!(
            fileset.files(),
            [dir.path().join("a.sql"), dir.path().join("b.sql")]
        );
    }

    #[test]
    fn single_star_stays_in_one_directory() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.sql");
        seed(dir.path(), "nested/b.sql");

        let pattern = format!("{}/*.sql", dir.path().display());
        let fileset = resolve(&pattern).unwrap();

        assert_eq!(fileset.files(), [dir.path().join("a.sql")]);
    }

    #[test]
    fn double_star_recurses() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.sql");
        seed(dir.path(), "nested/deep/b.sql");

        let pattern = format!("{}/**/*.sql", dir.path().display());
        let fileset = resolve(&pattern).unwrap();

        assert_eq!(
            fileset.files(),
            [
                dir.path().join("a.sql"),
                dir.path().join("nested/deep/b.sql"),
            ]
        );
    }

    #[test]
    fn directories_are_never_matched() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("only_dirs.sql")).unwrap();

        let pattern = format!("{}/*.sql", dir.path().display());
        let err = resolve(&pattern).unwrap_err();
        assert!(matches!(err, FilesetError::NoMatch { .. }));
    }

    #[test]
    fn zero_matches_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.sql", dir.path().display());

        let err = resolve(&pattern).unwrap_err();
        assert!(err.to_string().contains("no input files matched"));
    }

    #[test]
    fn missing_prefix_directory_is_no_match() {
        let pattern = "/definitely/not/a/real/dir/*.sql";
        let err = resolve(pattern).unwrap_err();
        assert!(matches!(err, FilesetError::NoMatch { .. }));
    }

    #[test]
    fn literal_file_pattern_resolves_to_that_file() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "a.sql");

        let pattern = format!("{}/a.sql", dir.path().display());
        let fileset = resolve(&pattern).unwrap();

        assert_eq!(fileset.root(), dir.path());
        assert_eq!(fileset.files(), [dir.path().join("a.sql")]);
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        let err = matcher("/data/[").unwrap_err();
        assert!(matches!(err, FilesetError::Pattern { .. }));
    }
}
