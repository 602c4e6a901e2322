//! Line-oriented helpers built on the atomic read and write operations.
//!
//! The whole file is buffered in memory in both directions.

use std::path::Path;

use super::error::FileResult;
use super::operations::{read_file_string_with_options, write_file_with_options};
use super::options::FileOptions;

/// Read a file as lines, without line terminators.
pub fn read_lines(path: impl AsRef<Path>) -> FileResult<Vec<String>> {
    read_lines_with_options(path, &FileOptions::default())
}

pub fn read_lines_with_options(
    path: impl AsRef<Path>,
    options: &FileOptions,
) -> FileResult<Vec<String>> {
    let content = read_file_string_with_options(path, options)?;
    Ok(content.lines().map(str::to_owned).collect())
}

/// Atomically write `lines`, each terminated by `\n`.
pub fn write_lines<S: AsRef<str>>(path: impl AsRef<Path>, lines: &[S]) -> FileResult<()> {
    write_lines_with_options(path, lines, &FileOptions::default())
}

pub fn write_lines_with_options<S: AsRef<str>>(
    path: impl AsRef<Path>,
    lines: &[S],
    options: &FileOptions,
) -> FileResult<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    write_file_with_options(path, content, options)
}

/// Rewrite every line of a file through `transform(line, index)`.
///
/// Line terminators (`\n` or `\r\n`) are kept as they were, including a
/// missing one on the last line, so the identity transform leaves the file
/// byte-for-byte unchanged.
pub fn modify_lines<F>(path: impl AsRef<Path>, transform: F) -> FileResult<()>
where
    F: FnMut(&str, usize) -> String,
{
    modify_lines_with_options(path, &FileOptions::default(), transform)
}

pub fn modify_lines_with_options<F>(
    path: impl AsRef<Path>,
    options: &FileOptions,
    mut transform: F,
) -> FileResult<()>
where
    F: FnMut(&str, usize) -> String,
{
    let path = path.as_ref();
    let content = read_file_string_with_options(path, options)?;

    let mut output = String::with_capacity(content.len());
    for (index, raw) in content.split_inclusive('\n').enumerate() {
        let (line, ending) = split_line_ending(raw);
        output.push_str(&transform(line, index));
        output.push_str(ending);
    }

    write_file_with_options(path, output, options)
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(line) = raw.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = raw.strip_suffix('\n') {
        (line, "\n")
    } else {
        (raw, "")
    }
}
