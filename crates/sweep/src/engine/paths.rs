use crate::error::{Result, SweepError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Expands a leading `~` to `$HOME`. Other paths are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

/// First free path among `path`, `name (1).ext`, `name (2).ext`, ...
///
/// The answer is only a snapshot; use [`move_to_free_path`] to claim a name.
pub fn resolve_conflict(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    let mut counter = 1u32;
    loop {
        let name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves `source` to `dest` without ever replacing an existing file.
///
/// A hard link claims `dest` atomically; where linking is not possible
/// (another filesystem, no link support) the contents are copied into a file
/// opened with `create_new`. Either way an occupied `dest` fails with
/// `AlreadyExists` and `source` is left alone.
pub fn move_path(source: &Path, dest: &Path) -> Result<()> {
    match fs::hard_link(source, dest) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(e.into()),
        Err(link_err) => {
            if !source.exists() {
                return Err(link_err.into());
            }
            log::debug!(
                "Link {} -> {} failed ({}), copying instead",
                source.display(),
                dest.display(),
                link_err
            );
            copy_new(source, dest)?;
        }
    }

    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(dest);
        return Err(e.into());
    }
    Ok(())
}

/// Moves `source` next to `dest` under the first name nobody holds and
/// returns where it landed. A name taken between the lookup and the move is
/// skipped, not overwritten.
pub fn move_to_free_path(source: &Path, dest: &Path) -> Result<PathBuf> {
    loop {
        let candidate = resolve_conflict(dest);
        match move_path(source, &candidate) {
            Ok(()) => return Ok(candidate),
            Err(SweepError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{} was taken, trying the next name", candidate.display());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Copies into a freshly created `dest`. A partial copy is removed; a `dest`
/// that already existed is never touched.
fn copy_new(source: &Path, dest: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let metadata = reader.metadata()?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(dest)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.set_permissions(metadata.permissions()))
        .and_then(|_| match metadata.modified() {
            Ok(modified) => writer.set_modified(modified),
            Err(_) => Ok(()),
        });
    if copied.is_err() {
        drop(writer);
        let _ = fs::remove_file(dest);
    }
    copied
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_free_path_returned_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("free.txt");
        assert_eq!(resolve_conflict(&path), path);
    }

    #[test]
    fn test_numeric_suffix_before_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.pdf");
        fs::write(&path, b"x").unwrap();
        assert_eq!(resolve_conflict(&path), temp_dir.path().join("report (1).pdf"));

        fs::write(temp_dir.path().join("report (1).pdf"), b"x").unwrap();
        assert_eq!(resolve_conflict(&path), temp_dir.path().join("report (2).pdf"));
    }

    #[test]
    fn test_suffix_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("README");
        fs::write(&path, b"x").unwrap();
        assert_eq!(resolve_conflict(&path), temp_dir.path().join("README (1)"));
    }

    #[test]
    fn test_expand_tilde() {
        let home = PathBuf::from(std::env::var("HOME").unwrap());
        assert_eq!(expand_tilde("~/Archive/2025-01"), home.join("Archive/2025-01"));
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_move_path() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        let dest = temp_dir.path().join("b.txt");
        fs::write(&source, b"payload").unwrap();

        move_path(&source, &dest).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_move_never_replaces_existing_dest() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("incoming.txt");
        let dest = temp_dir.path().join("taken.txt");
        fs::write(&source, b"incoming").unwrap();
        fs::write(&dest, b"someone else's file").unwrap();

        let err = move_path(&source, &dest).unwrap_err();
        assert!(matches!(&err, SweepError::Io(e) if e.kind() == ErrorKind::AlreadyExists));
        assert_eq!(fs::read(&dest).unwrap(), b"someone else's file");
        assert_eq!(fs::read(&source).unwrap(), b"incoming");
    }

    #[test]
    fn test_copy_fallback_refuses_existing_dest() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        let dest = temp_dir.path().join("b.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        let err = copy_new(&source, &dest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn test_copy_fallback_keeps_modified_time() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        let dest = temp_dir.path().join("b.txt");
        fs::write(&source, b"payload").unwrap();
        let mtime = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);
        File::options().write(true).open(&source).unwrap().set_modified(mtime).unwrap();

        copy_new(&source, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        assert_eq!(fs::metadata(&dest).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_move_to_free_path_skips_taken_names() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/notes.txt");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"mine").unwrap();
        let dest = temp_dir.path().join("notes.txt");
        fs::write(&dest, b"first").unwrap();
        fs::write(temp_dir.path().join("notes (1).txt"), b"second").unwrap();

        let landed = move_to_free_path(&source, &dest).unwrap();
        assert_eq!(landed, temp_dir.path().join("notes (2).txt"));
        assert_eq!(fs::read(&landed).unwrap(), b"mine");
        assert_eq!(fs::read(&dest).unwrap(), b"first");
        assert!(!source.exists());
    }

    #[test]
    fn test_move_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = move_path(&temp_dir.path().join("gone"), &temp_dir.path().join("dest"));
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn prop_resolving_twice_never_repeats(stem in "[a-zA-Z0-9_-]{1,12}", ext in proptest::option::of("[a-z]{1,4}")) {
            let temp_dir = TempDir::new().unwrap();
            let name = match &ext {
                Some(ext) => format!("{}.{}", stem, ext),
                None => stem.clone(),
            };
            let taken = temp_dir.path().join(&name);
            fs::write(&taken, b"x").unwrap();

            let first = resolve_conflict(&taken);
            prop_assert_ne!(&first, &taken);
            fs::write(&first, b"x").unwrap();

            let second = resolve_conflict(&taken);
            prop_assert_ne!(&second, &first);
            prop_assert_ne!(&second, &taken);
            prop_assert!(!second.exists());
        }
    }
}
