//! Atomic file operations.
//!
//! Reads and writes validate their path against `FileOptions::base_dir`
//! before touching disk. Writes go to a freshly created sibling `.tmp` file
//! which is synced and then renamed over the target, so readers see either
//! the old content or the new content, never a partial write.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, instrument};

use super::error::{FileError, FileResult};
use super::options::FileOptions;

/// Suffix of the sibling file used for atomic writes.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Names tried before giving up on creating a temporary file.
const MAX_TEMP_ATTEMPTS: u32 = 32;

static TEMP_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Permission bits for files created by append and plain copy.
pub const SHARED_FILE_MODE: u32 = 0o644;

/// Read a whole file with default options.
pub fn read_file(path: impl AsRef<Path>) -> FileResult<Vec<u8>> {
    read_file_with_options(path, &FileOptions::default())
}

/// Read a whole file after validating it against `options`.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_file_with_options(path: impl AsRef<Path>, options: &FileOptions) -> FileResult<Vec<u8>> {
    let path = path.as_ref();
    options.validate(path)?;

    let data = fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes", data.len());
    Ok(data)
}

/// Read a whole file as UTF-8 text with default options.
pub fn read_file_string(path: impl AsRef<Path>) -> FileResult<String> {
    read_file_string_with_options(path, &FileOptions::default())
}

/// Read a whole file as UTF-8 text after validating it against `options`.
pub fn read_file_string_with_options(
    path: impl AsRef<Path>,
    options: &FileOptions,
) -> FileResult<String> {
    let path = path.as_ref();
    let data = read_file_with_options(path, options)?;
    String::from_utf8(data).map_err(|source| FileError::InvalidUtf8 {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomically write a file with default options.
pub fn write_file(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> FileResult<()> {
    write_file_with_options(path, data, &FileOptions::default())
}

/// Atomically write a file.
///
/// The data is written and synced to a new `<name>.<pid>.<n>.tmp` sibling,
/// which is then renamed over `path`. The sibling is created exclusively, so
/// a pre-existing file or symlink under that name is never opened. If either
/// step fails the temporary file is removed and the target is left as it was.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_file_with_options(
    path: impl AsRef<Path>,
    data: impl AsRef<[u8]>,
    options: &FileOptions,
) -> FileResult<()> {
    let path = path.as_ref();
    let data = data.as_ref();
    options.validate(path)?;

    if options.create_dirs {
        ensure_parent_dir(path)?;
    }

    let write_err = |source: io::Error| FileError::WriteTemp {
        path: path.to_path_buf(),
        source,
    };
    let (temp, file) = create_temp(path, options.mode).map_err(write_err)?;
    if let Err(source) = fill_temp(file, data, options.mode) {
        remove_temp(&temp);
        return Err(write_err(source));
    }

    if let Err(source) = fs::rename(&temp, path) {
        remove_temp(&temp);
        return Err(FileError::Rename {
            from: temp,
            to: path.to_path_buf(),
            source,
        });
    }

    debug!("Wrote {} bytes", data.len());
    Ok(())
}

/// Atomically write UTF-8 text with default options.
pub fn write_file_string(path: impl AsRef<Path>, content: &str) -> FileResult<()> {
    write_file(path, content)
}

/// Atomically write UTF-8 text.
pub fn write_file_string_with_options(
    path: impl AsRef<Path>,
    content: &str,
    options: &FileOptions,
) -> FileResult<()> {
    write_file_with_options(path, content, options)
}

/// Append to a file, creating it if needed.
///
/// Appends are neither validated nor atomic: a crash mid-write can leave a
/// partial record. Meant for log-like files.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn append_to_file(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> FileResult<()> {
    let path = path.as_ref();
    let data = data.as_ref();
    let append_err = |source: io::Error| FileError::Append {
        path: path.to_path_buf(),
        source,
    };

    let mut file = create_options(SHARED_FILE_MODE)
        .append(true)
        .open(path)
        .map_err(append_err)?;
    file.write_all(data).map_err(append_err)?;

    debug!("Appended {} bytes", data.len());
    Ok(())
}

/// Append UTF-8 text to a file, creating it if needed.
pub fn append_to_file_string(path: impl AsRef<Path>, content: &str) -> FileResult<()> {
    append_to_file(path, content)
}

/// Copy `src` to `dst` and sync `dst` to storage before returning.
///
/// No validation and no directory creation; see [`copy_file_with_options`].
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> FileResult<()> {
    copy_stream(src.as_ref(), dst.as_ref(), SHARED_FILE_MODE)
}

/// Copy `src` to `dst`, validating both ends against `options.base_dir`.
///
/// The destination is created with `options.mode`, after creating its parent
/// directories when `options.create_dirs` is set.
#[instrument(skip_all, fields(src = %src.as_ref().display(), dst = %dst.as_ref().display()))]
pub fn copy_file_with_options(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    options: &FileOptions,
) -> FileResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    options.validate(src)?;
    options.validate(dst)?;

    if options.create_dirs {
        ensure_parent_dir(dst)?;
    }

    copy_stream(src, dst, options.mode)
}

/// Whether anything exists at `path` (following symlinks).
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    fs::metadata(path).is_ok()
}

/// Whether `path` is a directory. Errors count as `false`.
pub fn is_directory(path: impl AsRef<Path>) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Whether `path` is a regular file. Errors count as `false`.
pub fn is_regular_file(path: impl AsRef<Path>) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

fn copy_stream(src: &Path, dst: &Path, mode: u32) -> FileResult<()> {
    let mut source = File::open(src).map_err(|source| FileError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let mut dest = create_options(mode)
        .write(true)
        .truncate(true)
        .open(dst)
        .map_err(|source| FileError::Create {
            path: dst.to_path_buf(),
            source,
        })?;

    let copied = io::copy(&mut source, &mut dest).map_err(|source| FileError::Copy {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    })?;
    dest.sync_all().map_err(|source| FileError::Sync {
        path: dst.to_path_buf(),
        source,
    })?;

    debug!("Copied {} bytes from {:?} to {:?}", copied, src, dst);
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> FileResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| FileError::CreateDirs {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn create_temp(path: &Path, mode: u32) -> io::Result<(PathBuf, File)> {
    create_temp_from(path, mode, TEMP_COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn create_temp_from(path: &Path, mode: u32, first: u32) -> io::Result<(PathBuf, File)> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = path.parent().unwrap_or(Path::new(""));
    let pid = std::process::id();

    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let mut candidate = name.to_owned();
        candidate.push(format!(".{pid}.{}{TEMP_SUFFIX}", first.wrapping_add(attempt)));
        let candidate = parent.join(candidate);

        // create_new fails on any existing entry, dangling symlinks included.
        match create_options(mode).write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free temporary file name",
    ))
}

fn fill_temp(mut file: File, data: &[u8], mode: u32) -> io::Result<()> {
    // Umask would otherwise narrow the requested bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))?;
    }

    file.write_all(data)?;
    file.sync_all()
}

fn remove_temp(temp: &Path) {
    if let Err(e) = fs::remove_file(temp) {
        debug!("Could not remove temporary file {:?}: {}", temp, e);
    }
}

fn create_options(mode: u32) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options
}
