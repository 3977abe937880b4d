#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use sweep_lib::engine::PlannerOptions;
use sweep_lib::index::WalkOptions;
use sweep_lib::{Classifier, Executor, ExecutorOptions, ScanOptions, Scanner, TarGzArchiver};
use tempfile::TempDir;

pub mod helpers;
pub use helpers::*;

/// Scratch layout: `home/` is scanned, the other folders receive output.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub trash: PathBuf,
    pub archive_root: PathBuf,
    pub compressed_root: PathBuf,
    pub organize_root: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().canonicalize().unwrap();
        let home = base.join("home");
        std::fs::create_dir_all(&home).unwrap();

        Self {
            home,
            trash: base.join("trash"),
            archive_root: base.join("Archive"),
            compressed_root: base.join("Compressed"),
            organize_root: base.join("Organized"),
            temp_dir,
        }
    }

    pub fn write(&self, relative: &str, content: &[u8], age_days: u64) -> PathBuf {
        let path = self.home.join(relative);
        write_aged(&path, content, age_days);
        path
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            walk: WalkOptions::default(),
            planner: PlannerOptions {
                archive_root: self.archive_root.to_string_lossy().to_string(),
                compressed_root: self.compressed_root.to_string_lossy().to_string(),
            },
            ..ScanOptions::default()
        }
    }

    pub fn scanner(&self) -> Scanner {
        Scanner::new(Classifier::default(), self.scan_options())
    }

    pub fn executor(&self) -> Executor {
        Executor::new(
            Arc::new(TarGzArchiver::default()),
            ExecutorOptions {
                trash_dir: Some(self.trash.clone()),
                verify_unchanged: true,
            },
        )
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        vec![self.home.clone()]
    }

    pub fn organize_root_str(&self) -> String {
        self.organize_root.to_string_lossy().to_string()
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }
}
