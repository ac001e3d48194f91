#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_matches::assert_matches;
use image::RgbImage;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vchat_core::AttachmentUpdate;
use vchat_core::ImageAttachmentManager;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.join(name);
    RgbImage::new(width, height).save(&path).unwrap();
    path
}

#[tokio::test]
async fn loads_images_and_skips_other_files() {
    let dir = TempDir::new().unwrap();
    let first = write_png(dir.path(), "first.png", 4, 3);
    let second = write_png(dir.path(), "second.png", 2, 2);
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();

    let mut manager = ImageAttachmentManager::new();
    let added = manager.add_files([first, notes.clone(), second]);

    assert_eq!(added.accepted.len(), 2);
    assert_eq!(added.skipped, vec![notes]);

    let updates = manager.settle().await;
    assert_eq!(updates.len(), 2);
    assert_eq!(manager.in_flight(), 0);

    let mut names: Vec<_> = manager
        .pending()
        .iter()
        .map(|a| a.filename.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["first.png", "second.png"]);

    let first = manager
        .pending()
        .iter()
        .find(|a| a.filename == "first.png")
        .unwrap();
    assert_eq!(first.mime, "image/png");
    assert_eq!(first.dimensions, Some((4, 3)));
    assert!(first.preview.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn unreadable_file_never_enters_pending_set() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.jpg");

    let mut manager = ImageAttachmentManager::new();
    let added = manager.add_files([missing.clone()]);
    assert_eq!(added.accepted.len(), 1);

    let update = manager.next_update().await.unwrap();
    assert_matches!(update, AttachmentUpdate::Failed { ref path, .. } if *path == missing);
    assert!(!manager.has_pending());
    assert_eq!(manager.next_update().await, None);
}

#[tokio::test]
async fn removing_a_loading_attachment_drops_its_result() {
    let dir = TempDir::new().unwrap();
    let keep = write_png(dir.path(), "keep.png", 1, 1);
    let drop = write_png(dir.path(), "drop.png", 1, 1);

    let mut manager = ImageAttachmentManager::new();
    let added = manager.add_files([keep, drop]);
    let dropped_id = added.accepted[1];
    assert!(manager.remove_attachment(dropped_id));

    let updates = manager.settle().await;
    assert!(updates.contains(&AttachmentUpdate::Discarded { id: dropped_id }));
    let names: Vec<_> = manager.pending().iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["keep.png"]);
}

#[tokio::test]
async fn clear_discards_pending_and_loading() {
    let dir = TempDir::new().unwrap();
    let loaded = write_png(dir.path(), "loaded.png", 1, 1);

    let mut manager = ImageAttachmentManager::new();
    manager.add_files([loaded]);
    manager.settle().await;
    assert!(manager.has_pending());

    let late = write_png(dir.path(), "late.png", 1, 1);
    manager.add_files([late]);
    manager.clear();

    let updates = manager.settle().await;
    assert_matches!(updates.as_slice(), [AttachmentUpdate::Discarded { .. }]);
    assert!(!manager.has_pending());
}
