//! Recursive file discovery by name suffix.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use super::error::{FileError, FileResult};

/// Collect every non-directory entry under `dir` whose file name ends with
/// `ext` (e.g. `".yml"`).
///
/// Symlinks are reported, not followed. Entries come back sorted by file
/// name within each directory. Any walk error aborts the scan.
#[instrument(skip_all, fields(dir = %dir.as_ref().display(), ext = %ext))]
pub fn find_files_with_extension(dir: impl AsRef<Path>, ext: &str) -> FileResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| FileError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(ext) {
            found.push(entry.into_path());
        }
    }

    debug!("Found {} files", found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_finds_nested_matches() {
        let temp_dir = TempDir::new().unwrap();
        let workflows = temp_dir.path().join(".github/workflows");
        fs::create_dir_all(workflows.join("nested")).unwrap();
        fs::write(workflows.join("ci.yml"), "").unwrap();
        fs::write(workflows.join("release.yaml"), "").unwrap();
        fs::write(workflows.join("nested/deploy.yml"), "").unwrap();
        fs::write(workflows.join("README.md"), "").unwrap();
        // Directories never match, even with the suffix.
        fs::create_dir(workflows.join("dir.yml")).unwrap();

        let found = find_files_with_extension(temp_dir.path(), ".yml").unwrap();
        assert_eq!(
            found,
            vec![workflows.join("ci.yml"), workflows.join("nested/deploy.yml")]
        );
    }

    #[test]
    fn test_empty_result() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_files_with_extension(temp_dir.path(), ".yml").unwrap().is_empty());
    }

    #[test]
    fn test_missing_dir_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_files_with_extension(temp_dir.path().join("missing"), ".yml");
        assert!(matches!(result, Err(FileError::Walk { .. })));
    }
}
