// Security module for path validation
//
// Every privileged file access goes through `validate_path` (directly or via
// the file store) so that reads and writes cannot leave the configured base
// directory through `..` segments, absolute paths or symlinks.

pub mod path_validator;

pub use path_validator::{
    DEFAULT_MAX_PATH_LENGTH, PathSecurityError, PathValidationOptions, clean_path,
    is_path_safe, join_and_validate_path, safe_abs, validate_path, validate_path_with_defaults,
};
