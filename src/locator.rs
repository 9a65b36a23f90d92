//! Repository location inside an arbitrary extracted directory tree.
//!
//! Uploaded archives put the repository at unpredictable depths (wrapping
//! directories, sibling files), so the locator scans for a `.git` metadata
//! directory or, failing that, a bare-repo layout identified by a `HEAD`
//! file.

use std::path::{Path, PathBuf};

use git2::Repository;
use walkdir::WalkDir;

use crate::error::LocateError;

/// Name of the metadata directory marking a non-bare repository.
const GIT_DIR: &str = ".git";

/// Find the repository root to open within `root`.
///
/// The first directory literally named `.git` wins and ends the search
/// (nested metadata directories such as submodules are not specially
/// handled). While no `.git` directory has been seen, the parent of the
/// first file named `HEAD` is remembered as a bare-repository candidate.
/// If neither pattern appears anywhere, `root` itself is returned and the
/// subsequent open step decides whether that is fatal.
pub fn locate_repository(root: &Path) -> Result<PathBuf, LocateError> {
    if !root.exists() {
        return Err(LocateError::RootNotFound(root.display().to_string()));
    }
    if !root.is_dir() {
        return Err(LocateError::NotADirectory(root.display().to_string()));
    }

    let mut bare_candidate: Option<PathBuf> = None;

    // Lexical order keeps "first match" deterministic across platforms.
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            // Unreadable entries degrade the search, they don't abort it.
            Err(e) => {
                tracing::debug!("Skipping unreadable entry during location: {e}");
                continue;
            }
        };

        if entry.file_type().is_dir() && entry.file_name() == GIT_DIR {
            tracing::debug!("Found metadata directory at {}", entry.path().display());
            return Ok(entry.into_path());
        }

        if bare_candidate.is_none() && entry.file_type().is_file() && entry.file_name() == "HEAD" {
            if let Some(parent) = entry.path().parent() {
                tracing::debug!("Bare repository candidate at {}", parent.display());
                bare_candidate = Some(parent.to_path_buf());
            }
        }
    }

    Ok(bare_candidate.unwrap_or_else(|| root.to_path_buf()))
}

/// Open the repository at `path`, falling back to upward discovery.
///
/// Failure here aborts the parse; there is no retry.
pub fn open_repository(path: &Path) -> Result<Repository, LocateError> {
    Repository::open(path)
        .or_else(|_| Repository::discover(path))
        .map_err(|e| LocateError::OpenFailed {
            path: path.display().to_string(),
            reason: e.message().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_nested_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        let repo_dir = dir.path().join("wrapper").join("project");
        fs::create_dir_all(repo_dir.join(".git")).unwrap();

        let found = locate_repository(dir.path()).unwrap();
        assert_eq!(found, repo_dir.join(".git"));
    }

    #[test]
    fn git_directory_beats_bare_head_candidate() {
        let dir = tempfile::tempdir().unwrap();
        // "a-bare" sorts before "b-project", so the HEAD file is seen first.
        let bare = dir.path().join("a-bare");
        fs::create_dir_all(&bare).unwrap();
        fs::write(bare.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        let repo_dir = dir.path().join("b-project");
        fs::create_dir_all(repo_dir.join(".git")).unwrap();

        let found = locate_repository(dir.path()).unwrap();
        assert_eq!(found, repo_dir.join(".git"));
    }

    #[test]
    fn bare_layout_detected_via_head_file() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("project.git");
        fs::create_dir_all(&bare).unwrap();
        fs::write(bare.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let found = locate_repository(dir.path()).unwrap();
        assert_eq!(found, bare);
    }

    #[test]
    fn falls_back_to_root_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "not a repo").unwrap();

        let found = locate_repository(dir.path()).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            locate_repository(&missing),
            Err(LocateError::RootNotFound(_))
        ));
    }

    #[test]
    fn open_fails_on_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open_repository(dir.path()),
            Err(LocateError::OpenFailed { .. })
        ));
    }

    #[test]
    fn open_succeeds_on_real_repository() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();

        let found = locate_repository(dir.path()).unwrap();
        assert!(open_repository(&found).is_ok());
    }
}
