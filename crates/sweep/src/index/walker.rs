use crate::config::Settings;
use crate::error::{Result, SweepError};
use crate::index::classifier::Classifier;
use crate::model::FileRecord;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default)]
pub struct WalkStats {
    pub files_found: usize,
    pub skipped: usize,
}

/// Options for directory enumeration
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// Directories with these extensions are treated as opaque packages.
    pub bundle_extensions: Vec<String>,
    pub exclude: Option<GlobSet>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default()).unwrap_or(Self {
            include_hidden: false,
            follow_symlinks: false,
            bundle_extensions: Vec::new(),
            exclude: None,
        })
    }
}

impl WalkOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            include_hidden: settings.include_hidden,
            follow_symlinks: settings.follow_symlinks,
            bundle_extensions: settings
                .bundle_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            exclude: build_globset(&settings.exclude)?,
        })
    }

    fn is_bundle(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .path()
                .extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    self.bundle_extensions.iter().any(|b| *b == ext)
                })
                .unwrap_or(false)
    }

    fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        match &self.exclude {
            Some(globset) => {
                let relative = path.strip_prefix(root).unwrap_or(path);
                globset.is_match(path) || globset.is_match(relative)
            }
            None => false,
        }
    }

    fn keep(&self, entry: &DirEntry, root: &Path) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if !self.include_hidden && is_hidden(entry) {
            return false;
        }
        if self.is_bundle(entry) {
            log::debug!("Skipping package {}", entry.path().display());
            return false;
        }
        !self.is_excluded(entry.path(), root)
    }
}

pub fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| SweepError::Config(format!("Invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    let globset = builder
        .build()
        .map_err(|e| SweepError::Config(format!("Failed to build globset: {}", e)))?;
    Ok(Some(globset))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Enumerates the regular files under `root`.
///
/// Entries whose metadata cannot be read are logged and counted in
/// `WalkStats::skipped`; they never abort the walk. Cancellation is checked
/// once per entry.
pub fn walk_root(
    root: &Path,
    classifier: &Classifier,
    options: &WalkOptions,
    cancel: &CancellationToken,
) -> Result<(Vec<FileRecord>, WalkStats)> {
    if !root.is_dir() {
        return Err(SweepError::Read {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut stats = WalkStats::default();
    let mut records = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|entry| options.keep(entry, root));

    for item in walker {
        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Walk error under {}: {}", root.display(), e);
                stats.skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Failed to read metadata for {}: {}", path.display(), e);
                stats.skipped += 1;
                continue;
            }
        };

        match FileRecord::from_metadata(path, &metadata, classifier.classify(path)) {
            Ok(record) => {
                stats.files_found += 1;
                records.push(record);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                stats.skipped += 1;
            }
        }
    }

    log::debug!(
        "Walked {}: {} files, {} skipped",
        root.display(),
        stats.files_found,
        stats.skipped
    );

    Ok((records, stats))
}
