use crate::error::{Result, SweepError};
use crate::index::classifier::Classifier;
use crate::util::format::format_bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Image,
    Document,
    Video,
    Audio,
    Archive,
    Screenshot,
    Download,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Image,
        Category::Document,
        Category::Video,
        Category::Audio,
        Category::Archive,
        Category::Screenshot,
        Category::Download,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Document => "document",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Archive => "archive",
            Category::Screenshot => "screenshot",
            Category::Download => "download",
            Category::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Category::Image),
            "document" => Ok(Category::Document),
            "video" => Ok(Category::Video),
            "audio" => Ok(Category::Audio),
            "archive" => Ok(Category::Archive),
            "screenshot" => Ok(Category::Screenshot),
            "download" => Ok(Category::Download),
            "unknown" => Ok(Category::Unknown),
            _ => Err(SweepError::Config(format!("Invalid category: {}", s))),
        }
    }

    /// Folder name used when organizing files by category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Image => "Images",
            Category::Document => "Documents",
            Category::Video => "Videos",
            Category::Audio => "Audio",
            Category::Archive => "Archives",
            Category::Screenshot => "Screenshots",
            Category::Download => "Downloads",
            Category::Unknown => "Unknown",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Image => "photo",
            Category::Document => "doc.text",
            Category::Video => "video",
            Category::Audio => "music.note",
            Category::Archive => "archivebox",
            Category::Screenshot => "camera",
            Category::Download => "arrow.down.circle",
            Category::Unknown => "questionmark.circle",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Image => "blue",
            Category::Document => "green",
            Category::Video => "purple",
            Category::Audio => "orange",
            Category::Archive => "gray",
            Category::Screenshot => "cyan",
            Category::Download => "yellow",
            Category::Unknown => "red",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Snapshot of one file taken during a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub category: Category,
    pub extension: String,
    pub is_duplicate: bool,
    pub duplicate_group: Option<String>,
}

impl FileRecord {
    /// Builds a record from already-read metadata.
    ///
    /// Birth time is not reported by every platform; the modification time
    /// stands in for it when missing.
    pub fn from_metadata(path: &Path, metadata: &fs::Metadata, category: Category) -> Result<Self> {
        let modified = metadata.modified().map_err(|source| SweepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let created = metadata.created().unwrap_or(modified);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            created_at: DateTime::<Utc>::from(created),
            modified_at: DateTime::<Utc>::from(modified),
            category,
            extension,
            is_duplicate: false,
            duplicate_group: None,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, classifier: &Classifier) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| SweepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_metadata(path, &metadata, classifier.classify(path))
    }

    pub(crate) fn into_duplicate(mut self, group: String) -> Self {
        self.is_duplicate = true;
        self.duplicate_group = Some(group);
        self
    }

    pub fn days_since_modified(&self, now: DateTime<Utc>) -> i64 {
        (now - self.modified_at).num_days().max(0)
    }

    pub fn is_old(&self, now: DateTime<Utc>, old_after_days: i64) -> bool {
        self.days_since_modified(now) > old_after_days
    }

    pub fn is_large(&self, threshold_bytes: u64) -> bool {
        self.size > threshold_bytes
    }

    pub fn formatted_size(&self) -> String {
        format_bytes(self.size)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Archive,
    Delete,
    Compress,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Move,
        ActionKind::Archive,
        ActionKind::Delete,
        ActionKind::Compress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Archive => "archive",
            ActionKind::Delete => "delete",
            ActionKind::Compress => "compress",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "move" => Ok(ActionKind::Move),
            "archive" => Ok(ActionKind::Archive),
            "delete" => Ok(ActionKind::Delete),
            "compress" => Ok(ActionKind::Compress),
            _ => Err(SweepError::Config(format!("Invalid action kind: {}", s))),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A proposed operation on one scanned file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupAction {
    pub id: ActionId,
    pub file: FileRecord,
    pub kind: ActionKind,
    /// Destination root as shown to the user, e.g. `~/Archive/2025-07` or `Trash`.
    pub destination: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub roots: Vec<PathBuf>,
    pub scanned_at: DateTime<Utc>,
    pub total_files: usize,
    pub skipped_entries: usize,
    pub files_by_category: BTreeMap<Category, Vec<FileRecord>>,
    pub duplicates: BTreeMap<String, Vec<FileRecord>>,
    pub old_files: Vec<FileRecord>,
    pub large_files: Vec<FileRecord>,
    pub suggested_actions: Vec<CleanupAction>,
}

impl ScanReport {
    pub fn total_size(&self) -> u64 {
        self.files_by_category
            .values()
            .flatten()
            .map(|f| f.size)
            .sum()
    }

    pub fn files_in(&self, category: Category) -> &[FileRecord] {
        self.files_by_category
            .get(&category)
            .map(|files| files.as_slice())
            .unwrap_or(&[])
    }

    /// Bytes that would be reclaimed by keeping one file per duplicate group.
    pub fn duplicate_waste_bytes(&self) -> u64 {
        self.duplicates
            .values()
            .map(|group| group.iter().skip(1).map(|f| f.size).sum::<u64>())
            .sum()
    }

    pub fn duplicate_file_count(&self) -> usize {
        self.duplicates.values().map(|group| group.len()).sum()
    }

    pub fn actions_of(&self, kind: ActionKind) -> impl Iterator<Item = &CleanupAction> {
        self.suggested_actions.iter().filter(move |a| a.kind == kind)
    }

    pub fn action(&self, id: ActionId) -> Option<&CleanupAction> {
        self.suggested_actions.iter().find(|a| a.id == id)
    }

    /// Suggested actions whose id is in `ids`, in plan order.
    pub fn select(&self, ids: &[ActionId]) -> Vec<CleanupAction> {
        self.suggested_actions
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect()
    }
}

/// Record of one completed action, enough to reverse it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoEntry {
    pub current_location: PathBuf,
    pub original_location: PathBuf,
    pub kind: ActionKind,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(size: u64, modified_at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/tmp/a.txt"),
            name: "a.txt".to_string(),
            size,
            created_at: modified_at,
            modified_at,
            category: Category::Document,
            extension: "txt".to_string(),
            is_duplicate: false,
            duplicate_group: None,
        }
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()).unwrap(), category);
        }
        assert!(Category::from_str("pictures").is_err());
    }

    #[test]
    fn test_age_and_size_flags() {
        let now = Utc::now();
        let old = record(10, now - Duration::days(100));
        let fresh = record(10, now - Duration::days(90));

        assert_eq!(old.days_since_modified(now), 100);
        assert!(old.is_old(now, 90));
        assert!(!fresh.is_old(now, 90));

        let threshold = 500 * 1024 * 1024;
        assert!(!record(threshold, now).is_large(threshold));
        assert!(record(threshold + 1, now).is_large(threshold));
    }

    #[test]
    fn test_future_modification_counts_as_zero_days() {
        let now = Utc::now();
        let future = record(1, now + Duration::days(3));
        assert_eq!(future.days_since_modified(now), 0);
    }

    #[test]
    fn test_from_path_reads_metadata() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("Report.PDF");
        fs::write(&path, b"0123456789").unwrap();

        let record = FileRecord::from_path(&path, &Classifier::default()).unwrap();
        assert_eq!(record.name, "Report.PDF");
        assert_eq!(record.extension, "pdf");
        assert_eq!(record.size, 10);
        assert_eq!(record.category, Category::Document);
        assert!(!record.is_duplicate);
    }

    #[test]
    fn test_from_path_missing_file_is_read_error() {
        let err = FileRecord::from_path("/definitely/not/here.txt", &Classifier::default())
            .unwrap_err();
        assert!(matches!(err, SweepError::Read { .. }));
    }
}
