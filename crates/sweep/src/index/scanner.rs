use crate::config::Settings;
use crate::engine::planner::{Planner, PlannerOptions};
use crate::error::{Result, SweepError};
use crate::index::classifier::Classifier;
use crate::index::dedup::{duplicate_groups, size_collisions};
use crate::index::hasher::{fingerprint, Fingerprint};
use crate::index::walker::{walk_root, WalkOptions};
use crate::model::{Category, FileRecord, ScanReport};
use crate::progress::{emit, ProgressEvent, ProgressSender};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub walk: WalkOptions,
    pub old_after_days: i64,
    pub large_file_bytes: u64,
    pub hash_concurrency: usize,
    pub planner: PlannerOptions,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            old_after_days: 90,
            large_file_bytes: 500 * 1024 * 1024,
            hash_concurrency: 8,
            planner: PlannerOptions::default(),
        }
    }
}

impl ScanOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            walk: WalkOptions::from_settings(settings)?,
            old_after_days: settings.old_after_days,
            large_file_bytes: settings.large_file_bytes()?,
            hash_concurrency: settings.hash_concurrency.max(1),
            planner: PlannerOptions::from_settings(settings),
        })
    }
}

pub struct Scanner {
    classifier: Arc<Classifier>,
    options: ScanOptions,
    progress: Option<ProgressSender>,
    cancel: CancellationToken,
}

impl Scanner {
    pub fn new(classifier: Classifier, options: ScanOptions) -> Self {
        Self {
            classifier: Arc::new(classifier),
            options,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            Classifier::from_settings(settings)?,
            ScanOptions::from_settings(settings)?,
        ))
    }

    pub fn with_progress(mut self, sender: ProgressSender) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn scan(&self, roots: &[PathBuf]) -> Result<ScanReport> {
        self.scan_at(roots, Utc::now()).await
    }

    /// Scans `roots`, judging file age against `now`.
    ///
    /// Roots are canonicalized, then walked concurrently. A root that cannot
    /// be resolved or read is logged and contributes nothing. Roots naming the
    /// same directory, or nested inside each other, yield each file once.
    pub async fn scan_at(&self, roots: &[PathBuf], now: DateTime<Utc>) -> Result<ScanReport> {
        let (roots, unresolved) = canonical_roots(roots);
        emit(self.progress.as_ref(), ProgressEvent::ScanStarted { roots: roots.len() });

        let (records, skipped) = self.walk_roots(&roots).await?;
        let skipped = skipped + unresolved;
        let fingerprints = self.fingerprint_candidates(&records).await?;

        let duplicate_indices = duplicate_groups(
            fingerprints
                .into_iter()
                .map(|(idx, fp)| (fp.key(), idx)),
        );

        let mut group_of: BTreeMap<usize, String> = BTreeMap::new();
        for (key, members) in &duplicate_indices {
            for idx in members {
                group_of.insert(*idx, key.clone());
            }
        }

        let records: Vec<FileRecord> = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| match group_of.remove(&idx) {
                Some(key) => record.into_duplicate(key),
                None => record,
            })
            .collect();

        let mut files_by_category: BTreeMap<Category, Vec<FileRecord>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for record in &records {
            files_by_category
                .entry(record.category)
                .or_default()
                .push(record.clone());
        }

        let duplicates: BTreeMap<String, Vec<FileRecord>> = duplicate_indices
            .into_iter()
            .map(|(key, members)| {
                let files = members.into_iter().map(|idx| records[idx].clone()).collect();
                (key, files)
            })
            .collect();

        let old_files: Vec<FileRecord> = records
            .iter()
            .filter(|r| r.is_old(now, self.options.old_after_days))
            .cloned()
            .collect();
        let large_files: Vec<FileRecord> = records
            .iter()
            .filter(|r| r.is_large(self.options.large_file_bytes))
            .cloned()
            .collect();

        let suggested_actions = Planner::new(self.options.planner.clone()).plan(
            &old_files,
            &duplicates,
            &large_files,
            now,
        );

        emit(
            self.progress.as_ref(),
            ProgressEvent::ScanFinished { total_files: records.len() },
        );

        log::info!(
            "Scanned {} files: {} duplicate groups, {} old, {} large, {} actions",
            records.len(),
            duplicates.len(),
            old_files.len(),
            large_files.len(),
            suggested_actions.len()
        );

        Ok(ScanReport {
            roots,
            scanned_at: now,
            total_files: records.len(),
            skipped_entries: skipped,
            files_by_category,
            duplicates,
            old_files,
            large_files,
            suggested_actions,
        })
    }

    /// Walks every root on the blocking pool. Returns records sorted by path.
    async fn walk_roots(&self, roots: &[PathBuf]) -> Result<(Vec<FileRecord>, usize)> {
        let handles: Vec<_> = roots
            .iter()
            .map(|root| {
                let root = root.clone();
                let classifier = Arc::clone(&self.classifier);
                let options = self.options.walk.clone();
                let cancel = self.cancel.clone();
                tokio::task::spawn_blocking(move || {
                    walk_root(&root, &classifier, &options, &cancel)
                })
            })
            .collect();

        let total = roots.len().max(1);
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut skipped = 0;

        for (done, (root, handle)) in roots.iter().zip(handles).enumerate() {
            match handle.await? {
                Ok((found, stats)) => {
                    skipped += stats.skipped;
                    records.extend(found.into_iter().filter(|r| seen.insert(r.path.clone())));
                }
                Err(SweepError::Cancelled) => return Err(SweepError::Cancelled),
                Err(e) => {
                    log::warn!("Skipping root {}: {}", root.display(), e);
                    skipped += 1;
                }
            }

            let location = root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| root.display().to_string());
            emit(
                self.progress.as_ref(),
                ProgressEvent::Scanning {
                    location,
                    fraction: (done + 1) as f64 / total as f64,
                },
            );
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok((records, skipped))
    }

    /// Fingerprints files whose size matches at least one other file, at most
    /// `hash_concurrency` at a time.
    async fn fingerprint_candidates(&self, records: &[FileRecord]) -> Result<Vec<(usize, Fingerprint)>> {
        let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
        let candidates = size_collisions(&sizes);
        let total = candidates.len();

        let semaphore = Arc::new(Semaphore::new(self.options.hash_concurrency.max(1)));
        let mut jobs = JoinSet::new();

        for idx in candidates {
            let path = records[idx].path.clone();
            let size = records[idx].size;
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();

            jobs.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SweepError::Join(e.to_string()))?;
                if cancel.is_cancelled() {
                    return Err(SweepError::Cancelled);
                }
                let fp = tokio::task::spawn_blocking(move || fingerprint(&path, size)).await?;
                Ok::<_, SweepError>((idx, fp))
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = jobs.join_next().await {
            if self.cancel.is_cancelled() {
                jobs.abort_all();
                return Err(SweepError::Cancelled);
            }
            let (idx, fp) = match joined? {
                Ok(pair) => pair,
                Err(e) => {
                    jobs.abort_all();
                    return Err(e);
                }
            };
            results.push((idx, fp));
            emit(
                self.progress.as_ref(),
                ProgressEvent::Hashing { done: results.len(), total },
            );
        }

        Ok(results)
    }
}

/// Resolves each root to an absolute path without `..` or symlinks and drops
/// repeats. Returns the resolved roots and how many failed to resolve.
fn canonical_roots(roots: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    let mut failed = 0;

    for root in roots {
        match std::fs::canonicalize(root) {
            Ok(path) => {
                if seen.insert(path.clone()) {
                    resolved.push(path);
                } else {
                    log::debug!("Root {} already included", root.display());
                }
            }
            Err(e) => {
                log::warn!("Skipping root {}: {}", root.display(), e);
                failed += 1;
            }
        }
    }

    (resolved, failed)
}
