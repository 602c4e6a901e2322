use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum path length used when the caller does not supply a positive limit.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 255;

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Base directory is not set")]
    BaseDirectoryNotSet,

    #[error("Path is empty")]
    EmptyPath,

    #[error("Path contains null bytes")]
    PathContainsNullBytes,

    #[error("Path length {length} exceeds maximum of {max}")]
    PathExceedsMaxLength { length: usize, max: usize },

    #[error("Failed to resolve base path '{path}': {error}")]
    FailedToResolveBasePath { path: PathBuf, error: io::Error },

    #[error("Failed to resolve path '{path}': {error}")]
    FailedToResolvePath { path: PathBuf, error: io::Error },

    #[error("Path '{path}' is outside allowed directory '{base}'")]
    PathOutsideAllowedDir { path: PathBuf, base: PathBuf },

    #[error("Path traversal detected in '{path}'")]
    PathTraversalDetected { path: PathBuf },

    #[error("Failed to evaluate symlink '{path}': {error}")]
    FailedToEvaluateSymlink { path: PathBuf, error: io::Error },

    #[error("Symlink '{path}' points to '{target}', outside allowed directory")]
    SymlinkOutsideAllowedDir { path: PathBuf, target: PathBuf },

    #[error("Path does not exist: '{path}'")]
    PathDoesNotExist { path: PathBuf },

    #[error("Failed to access path '{path}': {error}")]
    FailedToAccessPath { path: PathBuf, error: io::Error },

    #[error("Path is not a regular file: '{path}'")]
    NotRegularFile { path: PathBuf },
}

impl PathSecurityError {
    /// Whether this error is a sandbox policy violation rather than bad input
    /// or a filesystem failure.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::PathOutsideAllowedDir { .. }
                | Self::PathTraversalDetected { .. }
                | Self::SymlinkOutsideAllowedDir { .. }
        )
    }
}

/// Options controlling how strictly a path is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathValidationOptions {
    /// Reject anything that exists but is not a regular file.
    pub require_regular_file: bool,

    /// Accept paths that do not exist yet (e.g. write targets).
    pub allow_non_existent: bool,

    /// Resolve symlinks and make sure their target stays inside the base.
    pub check_symlinks: bool,

    /// Maximum path length in bytes. Zero means [`DEFAULT_MAX_PATH_LENGTH`].
    pub max_path_length: usize,
}

impl Default for PathValidationOptions {
    fn default() -> Self {
        Self {
            require_regular_file: false,
            allow_non_existent: true,
            check_symlinks: true,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }
}

impl PathValidationOptions {
    fn effective_max_length(&self) -> usize {
        if self.max_path_length > 0 {
            self.max_path_length
        } else {
            DEFAULT_MAX_PATH_LENGTH
        }
    }
}

/// Validates that `path` stays inside `base_dir`.
///
/// Checks run in a fixed order and stop at the first failure:
/// 1. Input sanity: base set, path non-blank, no NUL bytes, length limit
/// 2. Lexical cleaning and resolution of both paths to absolute form
/// 3. Containment: the cleaned path must sit under the base on a component
///    boundary, and the relative path between them must not climb out
/// 4. Symlinks (when enabled): the link target must also resolve inside
///    the base, itself resolved through any symlinks
/// 5. Existence and node type according to `options`
///
/// Relative inputs are resolved against the current working directory.
/// Use [`join_and_validate_path`] to resolve against the base instead.
///
/// This function has no side effects on the filesystem.
///
/// # Examples
///
/// ```rust,no_run
/// use workflow_safe_fs::core::security::{validate_path, PathValidationOptions};
///
/// let options = PathValidationOptions::default();
/// assert!(validate_path("/tmp/base", "/tmp/base/sub/file.txt", &options).is_ok());
/// assert!(validate_path("/tmp/base", "/tmp/base/sub/../../etc/passwd", &options).is_err());
/// ```
pub fn validate_path(
    base_dir: impl AsRef<Path>,
    path: impl AsRef<Path>,
    options: &PathValidationOptions,
) -> Result<(), PathSecurityError> {
    let base_dir = base_dir.as_ref();
    let path = path.as_ref();

    if base_dir.as_os_str().is_empty() {
        return Err(PathSecurityError::BaseDirectoryNotSet);
    }

    if path.to_string_lossy().trim().is_empty() {
        return Err(PathSecurityError::EmptyPath);
    }

    if contains_nul(base_dir) || contains_nul(path) {
        return Err(PathSecurityError::PathContainsNullBytes);
    }

    let length = path.as_os_str().len();
    let max = options.effective_max_length();
    if length > max {
        return Err(PathSecurityError::PathExceedsMaxLength { length, max });
    }

    let abs_base = absolute_clean(base_dir).map_err(|error| {
        PathSecurityError::FailedToResolveBasePath {
            path: base_dir.to_path_buf(),
            error,
        }
    })?;
    let abs_path =
        absolute_clean(path).map_err(|error| PathSecurityError::FailedToResolvePath {
            path: path.to_path_buf(),
            error,
        })?;

    // Component-wise, so `/data/app` never admits `/data/app-other`.
    if !abs_path.starts_with(&abs_base) {
        warn!(
            "Rejected path outside base: {:?} (base {:?})",
            abs_path, abs_base
        );
        return Err(PathSecurityError::PathOutsideAllowedDir {
            path: abs_path,
            base: abs_base,
        });
    }

    if escapes_base(&abs_base, &abs_path) {
        warn!("Rejected path traversal: {:?}", path);
        return Err(PathSecurityError::PathTraversalDetected {
            path: path.to_path_buf(),
        });
    }

    if options.check_symlinks {
        check_symlink(&abs_base, &abs_path)?;
    }

    match std::fs::metadata(&abs_path) {
        Ok(metadata) => {
            if options.require_regular_file && !metadata.is_file() {
                return Err(PathSecurityError::NotRegularFile { path: abs_path });
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if !options.allow_non_existent {
                return Err(PathSecurityError::PathDoesNotExist { path: abs_path });
            }
        }
        Err(error) => {
            return Err(PathSecurityError::FailedToAccessPath {
                path: abs_path,
                error,
            });
        }
    }

    debug!("Validated path {:?} against base {:?}", abs_path, abs_base);
    Ok(())
}

/// Validates with the default options: non-existent paths allowed,
/// symlinks checked, 255-byte limit, any node type.
pub fn validate_path_with_defaults(
    base_dir: impl AsRef<Path>,
    path: impl AsRef<Path>,
) -> Result<(), PathSecurityError> {
    validate_path(base_dir, path, &PathValidationOptions::default())
}

/// Convenience predicate over [`validate_path_with_defaults`].
pub fn is_path_safe(base_dir: impl AsRef<Path>, path: impl AsRef<Path>) -> bool {
    validate_path_with_defaults(base_dir, path).is_ok()
}

/// Joins `elements`, validates the result against `base_dir` and returns the
/// joined path.
///
/// Relative joins are resolved against `base_dir` for validation, but the
/// returned path stays relative: `("/tmp/base", ["a", "b.txt"])` yields
/// `a/b.txt`. Only the first non-empty element may be absolute; root markers
/// on later elements are dropped, so `["sub", "/x"]` joins to `sub/x`.
pub fn join_and_validate_path<I, P>(
    base_dir: impl AsRef<Path>,
    elements: I,
) -> Result<PathBuf, PathSecurityError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let base_dir = base_dir.as_ref();
    let mut joined = PathBuf::new();
    for element in elements {
        let element = element.as_ref();
        if joined.as_os_str().is_empty() {
            joined.push(element);
        } else {
            joined.extend(
                element
                    .components()
                    .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_))),
            );
        }
    }
    if joined.as_os_str().is_empty() {
        return Err(PathSecurityError::EmptyPath);
    }
    let joined = clean_path(&joined);

    let full = if joined.is_absolute() {
        joined.clone()
    } else {
        base_dir.join(&joined)
    };
    validate_path_with_defaults(base_dir, &full)?;

    Ok(joined)
}

/// Validates `path` and returns its cleaned absolute form.
pub fn safe_abs(
    base_dir: impl AsRef<Path>,
    path: impl AsRef<Path>,
) -> Result<PathBuf, PathSecurityError> {
    let path = path.as_ref();
    validate_path_with_defaults(base_dir, path)?;

    absolute_clean(path).map_err(|error| PathSecurityError::FailedToResolvePath {
        path: path.to_path_buf(),
        error,
    })
}

/// Lexically cleans a path without touching the filesystem.
///
/// Drops `.` segments and redundant separators, and folds `..` into the
/// preceding segment. A `..` directly under the root is dropped; leading `..`
/// on a relative path is kept. An empty result becomes `.`.
pub fn clean_path(path: impl AsRef<Path>) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

fn contains_nul(path: &Path) -> bool {
    path.as_os_str().as_encoded_bytes().contains(&0)
}

fn absolute_clean(path: &Path) -> io::Result<PathBuf> {
    let cleaned = clean_path(path);
    Ok(clean_path(std::path::absolute(cleaned)?))
}

/// True when the relative path from `base` to `target` climbs out of `base`.
///
/// Both inputs must be cleaned absolute paths.
fn escapes_base(base: &Path, target: &Path) -> bool {
    match target.strip_prefix(base) {
        Ok(relative) => matches!(
            relative.components().next(),
            Some(Component::ParentDir) | Some(Component::RootDir) | Some(Component::Prefix(_))
        ),
        Err(_) => true,
    }
}

fn check_symlink(abs_base: &Path, abs_path: &Path) -> Result<(), PathSecurityError> {
    // Only the final component is inspected, without following it.
    let is_symlink = std::fs::symlink_metadata(abs_path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return Ok(());
    }

    // canonicalize reports ELOOP for cyclic chains.
    let target = abs_path
        .canonicalize()
        .map_err(|error| PathSecurityError::FailedToEvaluateSymlink {
            path: abs_path.to_path_buf(),
            error,
        })?;
    let real_base = abs_base
        .canonicalize()
        .map_err(|error| PathSecurityError::FailedToEvaluateSymlink {
            path: abs_base.to_path_buf(),
            error,
        })?;

    if escapes_base(&real_base, &target) {
        warn!("Rejected symlink {:?} -> {:?}", abs_path, target);
        return Err(PathSecurityError::SymlinkOutsideAllowedDir {
            path: abs_path.to_path_buf(),
            target,
        });
    }

    Ok(())
}
