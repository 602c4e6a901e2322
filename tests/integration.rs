//! End-to-end tests over the public surface: validator, file store and locks.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use workflow_safe_fs::core::security::{
    PathSecurityError, PathValidationOptions, is_path_safe, join_and_validate_path, validate_path,
};
use workflow_safe_fs::domains::files::{
    FileError, find_files_with_extension, modify_lines, read_file, write_file,
    write_file_with_options,
};
use workflow_safe_fs::{Config, FileOptions, FileStore, LockRegistry};

fn repo_with_workflows() -> Result<TempDir> {
    let repo = TempDir::new()?;
    let workflows = repo.path().join(".github/workflows");
    fs::create_dir_all(&workflows)?;
    fs::write(
        workflows.join("ci.yml"),
        "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v3\n",
    )?;
    fs::write(
        workflows.join("release.yml"),
        "jobs:\n  release:\n    steps:\n      - uses: actions/checkout@v3\n",
    )?;
    Ok(repo)
}

#[test]
fn scan_and_update_workflows() -> Result<()> {
    let repo = repo_with_workflows()?;
    let mut config = Config::default();
    config.security.base_dir = Some(repo.path().to_path_buf());
    config.security.require_regular_file = true;
    config.security.allow_non_existent = false;

    let store = FileStore::from_config(&config, Arc::new(LockRegistry::new()));
    let files = find_files_with_extension(repo.path(), ".yml")?;
    assert_eq!(files.len(), 2);

    thread::scope(|s| -> Result<()> {
        let store = &store;
        let workers: Vec<_> = files
            .iter()
            .map(|file| {
                s.spawn(move || store.modify_lines(file, |line, _| line.replace("@v3", "@v4")))
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker thread panicked")?;
        }
        Ok(())
    })?;

    for file in &files {
        let content = store.read_string(file)?;
        assert!(content.contains("actions/checkout@v4"));
        assert!(!content.contains("@v3"));
    }
    Ok(())
}

#[test]
fn traversal_variants_are_rejected() -> Result<()> {
    let root = TempDir::new()?;
    let base = root.path().join("base");
    fs::create_dir(&base)?;
    let options = PathValidationOptions::default();

    let absolute = base.join("sub/../../etc/passwd");
    let dotted = base.join("./a/../../b");
    for candidate in [absolute, dotted, root.path().join("base-sibling/x")] {
        match validate_path(&base, &candidate, &options) {
            Err(e) => assert!(e.is_policy_violation(), "{candidate:?}: {e}"),
            Ok(()) => panic!("{candidate:?} should be rejected"),
        }
    }

    assert!(is_path_safe(&base, base.join("deep/nested/file.yml")));
    assert_eq!(
        join_and_validate_path(&base, ["a", "b.txt"])?,
        std::path::PathBuf::from("a/b.txt")
    );
    Ok(())
}

#[test]
fn failed_write_keeps_previous_content() -> Result<()> {
    let dir = TempDir::new()?;
    // Long enough that the temporary sibling name exceeds the filesystem limit.
    let target = dir.path().join(format!("{}.yml", "w".repeat(246)));
    write_file(&target, "name: original\n")?;

    let result = write_file(&target, "name: broken\n");

    assert!(matches!(result, Err(FileError::WriteTemp { .. })));
    assert_eq!(read_file(&target)?, b"name: original\n");
    Ok(())
}

#[test]
fn identity_modify_is_a_no_op() -> Result<()> {
    let repo = repo_with_workflows()?;
    let path = repo.path().join(".github/workflows/ci.yml");
    let before = fs::read(&path)?;

    modify_lines(&path, |line, _| line.to_string())?;
    modify_lines(&path, |line, _| line.to_string())?;

    assert_eq!(fs::read(&path)?, before);
    Ok(())
}

#[test]
fn empty_base_dir_skips_validation() -> Result<()> {
    let dir = TempDir::new()?;
    let options = FileOptions {
        base_dir: Some(std::path::PathBuf::new()),
        ..FileOptions::default()
    };
    let store = FileStore::new(options, Arc::new(LockRegistry::new()));

    let path = dir.path().join("anywhere.txt");
    store.write(&path, "ok")?;
    assert_eq!(store.read(&path)?, b"ok");
    Ok(())
}

#[cfg(unix)]
#[test]
fn symlink_escape_through_store_is_rejected() -> Result<()> {
    use std::os::unix::fs::symlink;

    let repo = TempDir::new()?;
    let outside = TempDir::new()?;
    let secret = outside.path().join("secret");
    fs::write(&secret, "do not touch")?;
    let link = repo.path().join("innocent.yml");
    symlink(&secret, &link)?;

    let store = FileStore::new(
        FileOptions::with_base_dir(repo.path()),
        Arc::new(LockRegistry::new()),
    );

    let err = store.write(&link, "overwritten").unwrap_err();
    assert!(matches!(
        err,
        FileError::Validation(PathSecurityError::SymlinkOutsideAllowedDir { .. })
    ));
    assert_eq!(fs::read_to_string(&secret)?, "do not touch");
    Ok(())
}

#[cfg(unix)]
#[test]
fn planted_temp_symlink_cannot_redirect_write() -> Result<()> {
    use std::os::unix::fs::symlink;

    let repo = TempDir::new()?;
    let outside = TempDir::new()?;
    let victim = outside.path().join("victim");
    fs::write(&victim, "untouched")?;

    let target = repo.path().join("ci.yml");
    symlink(&victim, repo.path().join("ci.yml.tmp"))?;

    write_file_with_options(&target, "name: CI\n", &FileOptions::with_base_dir(repo.path()))?;

    assert_eq!(fs::read_to_string(&victim)?, "untouched");
    assert!(fs::symlink_metadata(&target)?.file_type().is_file());
    assert_eq!(fs::read_to_string(&target)?, "name: CI\n");
    Ok(())
}

#[test]
fn shared_registry_serializes_across_stores() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("shared.txt");
    let locks = Arc::new(LockRegistry::new());
    let a = FileStore::new(FileOptions::default(), Arc::clone(&locks));
    let b = FileStore::new(FileOptions::default(), Arc::clone(&locks));

    let guard = locks.guard(&path);
    let writer = {
        let path = path.clone();
        thread::spawn(move || b.write(&path, "from b"))
    };

    thread::sleep(Duration::from_millis(20));
    assert!(!writer.is_finished());
    assert!(!path.exists());
    drop(guard);

    writer.join().expect("writer thread panicked")?;
    assert_eq!(a.read_string(&path)?, "from b");
    Ok(())
}
