use crate::engine::archiver::Archiver;
use crate::engine::paths::{ensure_dir, move_path};
use crate::error::{Result, SweepError};
use crate::model::{ActionKind, UndoEntry};
use std::fs;
use std::path::{Path, PathBuf};

/// Reverses one completed action.
///
/// Nothing is overwritten: an occupied original location fails with
/// `Conflict`. On failure the filesystem is left as it was found.
pub fn revert(entry: &UndoEntry, archiver: &dyn Archiver) -> Result<()> {
    if entry.original_location.exists() {
        return Err(SweepError::Conflict {
            path: entry.original_location.clone(),
        });
    }
    if !entry.current_location.exists() {
        return Err(SweepError::TargetMissing(entry.current_location.clone()));
    }

    if let Some(parent) = entry.original_location.parent() {
        ensure_dir(parent)?;
    }

    let restored = match entry.kind {
        ActionKind::Move | ActionKind::Delete => {
            move_path(&entry.current_location, &entry.original_location)
        }
        ActionKind::Archive | ActionKind::Compress => {
            restore_from_archive(archiver, &entry.current_location, &entry.original_location)
        }
    };
    restored?;

    log::info!(
        "Restored {} from {}",
        entry.original_location.display(),
        entry.current_location.display()
    );
    Ok(())
}

/// Extracts `archive` into a staging directory and moves its single file to
/// `original`. The archive is removed once the file is back in place.
fn restore_from_archive(archiver: &dyn Archiver, archive: &Path, original: &Path) -> Result<()> {
    let staging = tempfile::Builder::new().prefix("sweep-restore-").tempdir()?;
    archiver.extract(archive, staging.path())?;

    let extracted = single_file(archive, staging.path())?;
    move_path(&extracted, original)?;

    if let Err(e) = fs::remove_file(archive) {
        log::warn!("Restored file but could not remove {}: {}", archive.display(), e);
    }
    Ok(())
}

fn single_file(archive: &Path, dir: &Path) -> Result<PathBuf> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();

    match entries.as_slice() {
        [only] if only.is_file() => Ok(only.clone()),
        _ => Err(SweepError::UndoMismatch {
            archive: archive.to_path_buf(),
            entries: entries.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::archiver::TarGzArchiver;
    use chrono::Utc;
    use flate2::{write::GzEncoder, Compression};
    use tempfile::TempDir;

    fn entry(current: PathBuf, original: PathBuf, kind: ActionKind) -> UndoEntry {
        UndoEntry {
            current_location: current,
            original_location: original,
            kind,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_revert_move() {
        let temp_dir = TempDir::new().unwrap();
        let moved = temp_dir.path().join("Organized/Documents/a.txt");
        fs::create_dir_all(moved.parent().unwrap()).unwrap();
        fs::write(&moved, b"a").unwrap();
        let original = temp_dir.path().join("Desktop/a.txt");

        revert(&entry(moved.clone(), original.clone(), ActionKind::Move), &TarGzArchiver::default())
            .unwrap();
        assert!(!moved.exists());
        assert_eq!(fs::read(&original).unwrap(), b"a");
    }

    #[test]
    fn test_revert_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let moved = temp_dir.path().join("moved.txt");
        let original = temp_dir.path().join("original.txt");
        fs::write(&moved, b"old").unwrap();
        fs::write(&original, b"new occupant").unwrap();

        let err = revert(&entry(moved.clone(), original.clone(), ActionKind::Delete), &TarGzArchiver::default())
            .unwrap_err();
        assert!(matches!(err, SweepError::Conflict { .. }));
        assert_eq!(fs::read(&original).unwrap(), b"new occupant");
        assert!(moved.exists());
    }

    #[test]
    fn test_revert_compress() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("big.iso");
        fs::write(&source, b"iso bytes").unwrap();
        let archive = temp_dir.path().join("big.iso.tar.gz");
        let archiver = TarGzArchiver::default();
        archiver.compress(&source, &archive).unwrap();
        fs::remove_file(&source).unwrap();

        revert(&entry(archive.clone(), source.clone(), ActionKind::Compress), &archiver).unwrap();
        assert_eq!(fs::read(&source).unwrap(), b"iso bytes");
        assert!(!archive.exists());
    }

    #[test]
    fn test_two_entry_archive_is_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let archive = temp_dir.path().join("both.tar.gz");
        let encoder = GzEncoder::new(fs::File::create(&archive).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_path_with_name(&a, "a.txt").unwrap();
        builder.append_path_with_name(&b, "b.txt").unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let original = temp_dir.path().join("restored.txt");
        let err = revert(&entry(archive.clone(), original.clone(), ActionKind::Archive), &TarGzArchiver::default())
            .unwrap_err();
        match err {
            SweepError::UndoMismatch { entries, .. } => assert_eq!(entries, 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(archive.exists());
        assert!(!original.exists());
    }

    #[test]
    fn test_missing_current_location() {
        let temp_dir = TempDir::new().unwrap();
        let err = revert(
            &entry(temp_dir.path().join("gone"), temp_dir.path().join("orig"), ActionKind::Move),
            &TarGzArchiver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SweepError::TargetMissing(_)));
    }
}
