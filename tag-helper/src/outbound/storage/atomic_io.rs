//! Crash-safe replacement of the storage file.
//!
//! Contents go to a hidden sibling first and are renamed over the target,
//! so a reader sees either the old record or the new one.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Component, Utf8Path};
use cap_std::fs::{Dir, OpenOptions};

use crate::domain::ports::KeyValueStoreError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` inside `dir` with `contents`.
///
/// # Errors
///
/// [`KeyValueStoreError::Write`] if `path` is not a bare file name or any
/// step of the write fails. The temporary file is removed on failure.
pub(super) fn replace_file(
    dir: &Dir,
    path: &Utf8Path,
    contents: &str,
) -> Result<(), KeyValueStoreError> {
    let mut components = path.components();
    let (Some(Utf8Component::Normal(file_name)), None) = (components.next(), components.next())
    else {
        return Err(KeyValueStoreError::write(format!(
            "storage path {path} must be a file name"
        )));
    };

    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

    let written = write_temp(dir, &tmp_name, contents)
        .and_then(|()| rename_over(dir, &tmp_name, file_name));
    if let Err(err) = written {
        // The temp file may never have been created.
        dir.remove_file(&tmp_name).ok();
        return Err(KeyValueStoreError::write(format!("{path}: {err}")));
    }

    if dir.open(".").and_then(|parent| parent.sync_all()).is_err() {
        tracing::debug!(%path, "directory sync skipped");
    }
    Ok(())
}

fn write_temp(dir: &Dir, tmp_name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(windows)]
fn rename_over(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn rename_over(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_std::ambient_authority;

    fn temp_dir() -> (tempfile::TempDir, Dir) {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
        (temp, dir)
    }

    #[test]
    fn replaces_existing_contents() {
        let (_temp, dir) = temp_dir();
        let path = Utf8Path::new("storage.json");

        replace_file(&dir, path, "{\"a\":1}").expect("first write");
        replace_file(&dir, path, "{\"a\":2}").expect("second write");

        assert_eq!(dir.read_to_string(path).expect("read"), "{\"a\":2}");
        let leftovers = dir
            .entries()
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn nested_paths_are_rejected() {
        let (_temp, dir) = temp_dir();
        let error = replace_file(&dir, Utf8Path::new("nested/storage.json"), "{}")
            .expect_err("nested path");
        assert!(matches!(error, KeyValueStoreError::Write { .. }));
    }
}
