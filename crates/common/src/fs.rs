//! Filesystem helpers for publishing files and directories atomically.
//!
//! Everything here stages next to the destination (same parent directory, so
//! the final `rename` never crosses a filesystem boundary) and only then moves
//! the result into place. Readers observe either the old state or the new one.

use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::debug;

/// Sibling path used to stage or retire `dest`: `<parent>/.<file_name>.<tag>-<uuid>`.
pub fn staging_path(dest: &Path, tag: &str) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let unique = uuid::Uuid::new_v4().simple().to_string();
    let staged = format!(".{file_name}.{tag}-{}", &unique[..12]);
    match dest.parent() {
        Some(parent) => parent.join(staged),
        None => PathBuf::from(staged),
    }
}

/// Write `contents` to `path` via a staged sibling file and a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let staged = staging_path(path, "tmp");
    if let Err(e) = std::fs::write(&staged, contents) {
        let _ = std::fs::remove_file(&staged);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&staged, path) {
        let _ = std::fs::remove_file(&staged);
        return Err(e);
    }
    debug!(path = %path.display(), bytes = contents.len(), "wrote file atomically");
    Ok(())
}

/// Remove a file or directory tree if it exists.
///
/// The target is first renamed to a hidden sibling, so a concurrent reader
/// never sees a half-deleted tree at `path`. Returns `false` when nothing was
/// there to remove.
pub fn remove_atomic(path: &Path) -> io::Result<bool> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if !meta.is_dir() {
        return match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        };
    }

    let retired = staging_path(path, "removing");
    match std::fs::rename(path, &retired) {
        Ok(()) => {},
        // Lost a race with another remover.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }
    std::fs::remove_dir_all(&retired)?;
    Ok(true)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_path_is_hidden_sibling() {
        let staged = staging_path(Path::new("/tmp/out/image"), "tmp");
        assert_eq!(staged.parent(), Some(Path::new("/tmp/out")));
        let name = staged.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".image.tmp-"), "got {name}");
    }

    #[test]
    fn staging_paths_are_unique() {
        let a = staging_path(Path::new("/x/y"), "tmp");
        let b = staging_path(Path::new("/x/y"), "tmp");
        assert_ne!(a, b);
    }

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a/b/SKILL.md");
        write_atomic(&target, b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");

        write_atomic(&target, b"again").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "again");

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("a/b"))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn remove_atomic_handles_dirs_files_and_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("skill");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/file.txt"), "x").unwrap();
        let file = tmp.path().join("rule.mdc");
        std::fs::write(&file, "x").unwrap();

        assert!(remove_atomic(&dir).unwrap());
        assert!(!dir.exists());
        assert!(remove_atomic(&file).unwrap());
        assert!(!file.exists());
        assert!(!remove_atomic(&dir).unwrap());

        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
