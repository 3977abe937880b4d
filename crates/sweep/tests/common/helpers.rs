use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use sweep_lib::{ActionKind, CleanupAction, ScanReport};

const DAY: u64 = 24 * 60 * 60;

pub fn write_aged(path: &Path, content: &[u8], age_days: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    set_age(path, age_days);
}

pub fn set_age(path: &Path, age_days: u64) {
    let mtime = SystemTime::now() - Duration::from_secs(age_days * DAY);
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(mtime).unwrap();
}

pub fn actions_for<'a>(report: &'a ScanReport, file_name: &str) -> Vec<&'a CleanupAction> {
    report
        .suggested_actions
        .iter()
        .filter(|a| a.file.name == file_name)
        .collect()
}

pub fn kinds(actions: &[&CleanupAction]) -> Vec<ActionKind> {
    let mut kinds: Vec<ActionKind> = actions.iter().map(|a| a.kind).collect();
    kinds.sort_by_key(|k| k.as_str());
    kinds
}

pub fn count_files(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
