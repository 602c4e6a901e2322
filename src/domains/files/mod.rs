//! Files domain module.
//!
//! This module is the only sanctioned way to read or write files on behalf of
//! the workflow tooling. Operations validate paths against an optional
//! sandbox root before touching disk and write atomically via a sibling
//! temporary file.
//!
//! ## Architecture
//!
//! - `options.rs` - Per-call `FileOptions`
//! - `operations.rs` - Read, atomic write, append, copy and predicates
//! - `lines.rs` - Line-oriented helpers
//! - `scanner.rs` - Recursive discovery of files by suffix
//! - `service.rs` - `FileStore`, the lock-aware service wrapping the above
//! - `error.rs` - File-specific error types

mod error;
mod lines;
mod operations;
mod options;
mod scanner;
mod service;

pub use error::{FileError, FileResult};
pub use lines::{
    modify_lines, modify_lines_with_options, read_lines, read_lines_with_options, write_lines,
    write_lines_with_options,
};
pub use operations::{
    SHARED_FILE_MODE, TEMP_SUFFIX, append_to_file, append_to_file_string, copy_file,
    copy_file_with_options, file_exists, is_directory, is_regular_file, read_file,
    read_file_string, read_file_string_with_options, read_file_with_options, write_file,
    write_file_string, write_file_string_with_options, write_file_with_options,
};
pub use options::{DEFAULT_FILE_MODE, FileOptions};
pub use scanner::find_files_with_extension;
pub use service::FileStore;
