mod common;

use common::*;
use sweep_lib::{ActionKind, Category};

#[tokio::test]
async fn test_duplicate_and_old_file_scenario() {
    let fx = TestFixture::new();
    fx.write("a.txt", b"0123456789", 100);
    fx.write("b.txt", b"0123456789", 1);

    let report = fx.scanner().scan(&fx.roots()).await.unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.duplicates.len(), 1);
    let group = report.duplicates.values().next().unwrap();
    assert_eq!(group.len(), 2);
    assert_eq!(report.duplicate_file_count(), 2);
    assert_eq!(report.duplicate_waste_bytes(), 10);

    assert_eq!(report.old_files.len(), 1);
    assert_eq!(report.old_files[0].name, "a.txt");

    let for_a = actions_for(&report, "a.txt");
    assert_eq!(kinds(&for_a), vec![ActionKind::Archive, ActionKind::Delete]);
    assert!(actions_for(&report, "b.txt").is_empty());
    assert_eq!(report.suggested_actions.len(), 2);
}

#[tokio::test]
async fn test_empty_directory() {
    let fx = TestFixture::new();

    let report = fx.scanner().scan(&fx.roots()).await.unwrap();

    assert_eq!(report.total_files, 0);
    assert_eq!(report.files_by_category.len(), 8);
    for category in Category::ALL {
        assert!(report.files_in(category).is_empty());
    }
    assert!(report.duplicates.is_empty());
    assert!(report.suggested_actions.is_empty());
}

#[tokio::test]
async fn test_delete_covers_all_but_newest() {
    let fx = TestFixture::new();
    fx.write("copy1.pdf", b"same pdf bytes", 30);
    fx.write("copy2.pdf", b"same pdf bytes", 20);
    fx.write("nested/copy3.pdf", b"same pdf bytes", 10);
    fx.write("newest.pdf", b"same pdf bytes", 2);

    let report = fx.scanner().scan(&fx.roots()).await.unwrap();

    assert_eq!(report.duplicates.len(), 1);
    let deletes: Vec<String> = report
        .actions_of(ActionKind::Delete)
        .map(|a| a.file.name.clone())
        .collect();
    assert_eq!(deletes.len(), 3);
    assert!(!deletes.contains(&"newest.pdf".to_string()));
    assert_eq!(report.duplicate_waste_bytes(), 3 * 14);
}

#[tokio::test]
async fn test_categories_and_screenshots() {
    let fx = TestFixture::new();
    fx.write("Screenshot 2025-01-01.png", b"s", 1);
    fx.write("holiday.jpg", b"jj", 1);
    fx.write("song.mp3", b"mmm", 1);
    fx.write("tool.app/Contents/MacOS/tool", b"bundle", 1);
    fx.write(".DS_Store", b"hidden", 1);
    fx.write("script.sh", b"#!/bin/sh", 1);

    let report = fx.scanner().scan(&fx.roots()).await.unwrap();

    assert_eq!(report.total_files, 4);
    assert_eq!(report.files_in(Category::Screenshot).len(), 1);
    assert_eq!(report.files_in(Category::Image).len(), 1);
    assert_eq!(report.files_in(Category::Audio).len(), 1);
    assert_eq!(report.files_in(Category::Unknown).len(), 1);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let fx = TestFixture::new();
    fx.write("a.txt", b"hello", 200);

    let report = fx.scanner().scan(&fx.roots()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["total_files"], 1);
    assert!(json["files_by_category"]["Document"].is_array());
    assert_eq!(json["suggested_actions"][0]["kind"], "Archive");
}
