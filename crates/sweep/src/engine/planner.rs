use crate::config::Settings;
use crate::model::{ActionId, ActionKind, CleanupAction, FileRecord, ScanReport};
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;

pub const TRASH_DESTINATION: &str = "Trash";

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    pub archive_root: String,
    pub compressed_root: String,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            archive_root: "~/Archive".to_string(),
            compressed_root: "~/Compressed".to_string(),
        }
    }
}

impl PlannerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            archive_root: settings.archive_root.clone(),
            compressed_root: settings.compressed_root.clone(),
        }
    }
}

/// Turns scan results into proposed cleanup actions. Performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    options: PlannerOptions,
}

impl Planner {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    /// Builds the default plan: archive old files, trash older duplicates,
    /// compress large files, in that order. Rules apply independently, so
    /// one file may receive several actions.
    pub fn plan(
        &self,
        old_files: &[FileRecord],
        duplicates: &BTreeMap<String, Vec<FileRecord>>,
        large_files: &[FileRecord],
        now: DateTime<Utc>,
    ) -> Vec<CleanupAction> {
        let mut ids = IdSequence::starting_at(1);
        let mut actions = Vec::new();

        let archive_dest = archive_destination(&self.options.archive_root, now);
        for file in old_files {
            actions.push(CleanupAction {
                id: ids.next(),
                file: file.clone(),
                kind: ActionKind::Archive,
                destination: archive_dest.clone(),
                description: format!(
                    "Archive old file ({} days old)",
                    file.days_since_modified(now)
                ),
            });
        }

        for group in duplicates.values() {
            for file in older_duplicates(group) {
                actions.push(CleanupAction {
                    id: ids.next(),
                    file: file.clone(),
                    kind: ActionKind::Delete,
                    destination: TRASH_DESTINATION.to_string(),
                    description: "Delete duplicate (keep newer version)".to_string(),
                });
            }
        }

        for file in large_files {
            actions.push(CleanupAction {
                id: ids.next(),
                file: file.clone(),
                kind: ActionKind::Compress,
                destination: self.options.compressed_root.clone(),
                description: format!("Compress large file ({})", file.formatted_size()),
            });
        }

        actions
    }

    /// Proposes moving every scanned file into `<root>/<Category>/`.
    ///
    /// Ids continue after the report's own suggestions so both sets can be
    /// offered together.
    pub fn organize(&self, report: &ScanReport, root: &str) -> Vec<CleanupAction> {
        let first = report
            .suggested_actions
            .iter()
            .map(|a| a.id.0)
            .max()
            .unwrap_or(0)
            + 1;
        let mut ids = IdSequence::starting_at(first);

        report
            .files_by_category
            .iter()
            .flat_map(|(category, files)| files.iter().map(move |f| (category, f)))
            .map(|(category, file)| CleanupAction {
                id: ids.next(),
                file: file.clone(),
                kind: ActionKind::Move,
                destination: root.to_string(),
                description: format!("Organize into {}", category.display_name()),
            })
            .collect()
    }
}

struct IdSequence(u64);

impl IdSequence {
    fn starting_at(first: u64) -> Self {
        Self(first)
    }

    fn next(&mut self) -> ActionId {
        let id = ActionId(self.0);
        self.0 += 1;
        id
    }
}

/// `<root>/<year>-<month>` for the month containing `now`.
pub fn archive_destination(root: &str, now: DateTime<Utc>) -> String {
    format!("{}/{}-{:02}", root.trim_end_matches('/'), now.year(), now.month())
}

/// Every member of a duplicate group except the newest.
///
/// Members are ordered by modification time, newest first, with ties broken
/// by path so the kept file is stable for a given input.
pub fn older_duplicates(group: &[FileRecord]) -> Vec<&FileRecord> {
    let mut sorted: Vec<&FileRecord> = group.iter().collect();
    sorted.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.path.cmp(&b.path))
    });
    sorted.into_iter().skip(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;

    fn record(path: &str, size: u64, modified_at: DateTime<Utc>) -> FileRecord {
        let path = PathBuf::from(path);
        FileRecord {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default(),
            path,
            size,
            created_at: modified_at,
            modified_at,
            category: Category::Document,
            is_duplicate: false,
            duplicate_group: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_archive_destination_is_year_month() {
        assert_eq!(archive_destination("~/Archive", now()), "~/Archive/2025-03");
        assert_eq!(archive_destination("/data/Archive/", now()), "/data/Archive/2025-03");
    }

    #[test]
    fn test_plan_orders_archive_delete_compress() {
        let now = now();
        let old = record("/d/old.txt", 10, now - Duration::days(120));
        let dup_new = record("/d/b.txt", 4, now - Duration::days(1));
        let dup_old = record("/d/a.txt", 4, now - Duration::days(2));
        let large = record("/d/movie.mov", 600 * 1024 * 1024, now);

        let mut duplicates = BTreeMap::new();
        duplicates.insert("h".to_string(), vec![dup_new, dup_old.clone()]);

        let actions = Planner::default().plan(&[old.clone()], &duplicates, &[large.clone()], now);

        let kinds: Vec<ActionKind> = actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Archive, ActionKind::Delete, ActionKind::Compress]);

        let ids: Vec<u64> = actions.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(actions[0].file, old);
        assert_eq!(actions[0].destination, "~/Archive/2025-03");
        assert_eq!(actions[1].file, dup_old);
        assert_eq!(actions[1].destination, TRASH_DESTINATION);
        assert_eq!(actions[2].file, large);
        assert_eq!(actions[2].destination, "~/Compressed");
    }

    #[test]
    fn test_rationale_strings() {
        let now = now();
        let old = record("/d/old.txt", 10, now - Duration::days(120));
        let large = record("/d/movie.mov", 600 * 1024 * 1024, now);
        let mut duplicates = BTreeMap::new();
        duplicates.insert(
            "h".to_string(),
            vec![record("/d/x", 1, now), record("/d/y", 1, now - Duration::days(1))],
        );

        let actions = Planner::default().plan(&[old], &duplicates, &[large], now);
        let descriptions: Vec<&str> = actions.iter().map(|a| a.description.as_str()).collect();

        insta::assert_debug_snapshot!(descriptions, @r###"
        [
            "Archive old file (120 days old)",
            "Delete duplicate (keep newer version)",
            "Compress large file (600.00 MB)",
        ]
        "###);
    }

    #[test]
    fn test_duplicate_tie_break_by_path() {
        let t = now();
        let group = vec![
            record("/d/c.txt", 1, t),
            record("/d/a.txt", 1, t),
            record("/d/b.txt", 1, t),
        ];
        let older: Vec<&str> = older_duplicates(&group)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(older, vec!["b.txt", "c.txt"]);
    }

    #[test]
    fn test_organize_continues_ids() {
        let t = now();
        let mut files_by_category: BTreeMap<Category, Vec<FileRecord>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        let mut pic = record("/d/pic.png", 1, t);
        pic.category = Category::Image;
        files_by_category.insert(Category::Image, vec![pic.clone()]);

        let report = ScanReport {
            roots: vec![PathBuf::from("/d")],
            scanned_at: t,
            total_files: 1,
            skipped_entries: 0,
            files_by_category,
            duplicates: BTreeMap::new(),
            old_files: Vec::new(),
            large_files: Vec::new(),
            suggested_actions: vec![CleanupAction {
                id: ActionId(4),
                file: pic.clone(),
                kind: ActionKind::Archive,
                destination: "~/Archive/2025-03".to_string(),
                description: String::new(),
            }],
        };

        let moves = Planner::default().organize(&report, "~/Organized");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].id, ActionId(5));
        assert_eq!(moves[0].kind, ActionKind::Move);
        assert_eq!(moves[0].destination, "~/Organized");
        insta::assert_snapshot!(moves[0].description, @"Organize into Images");
    }
}
