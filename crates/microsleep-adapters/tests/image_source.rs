//! Integration tests for the filesystem image source.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use microsleep_adapters::FsImageSource;
use microsleep_core::ImageSource;
use std::fs;

#[test]
fn test_reads_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    fs::write(&path, b"png bytes").unwrap();

    let source = FsImageSource::new(vec![path], false);
    let images: Vec<_> = source.images().collect();
    assert_eq!(images.len(), 1);

    let input = images.into_iter().next().unwrap().expect("should read file");
    assert_eq!(input.bytes, b"png bytes");
    assert!(input.path.ends_with("face.png"));
}

#[test]
fn test_directory_scan_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.jpg"), b"b").unwrap();
    fs::write(dir.path().join("a.png"), b"a").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    assert_eq!(source.count_hint(), Some(2));

    let paths: Vec<String> = source.images().map(|r| r.unwrap().path).collect();
    assert!(paths[0].ends_with("a.png"));
    assert!(paths[1].ends_with("b.jpg"));
}

#[test]
fn test_recursive_scan() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("deep.jpeg"), b"x").unwrap();
    fs::write(dir.path().join("top.jpg"), b"x").unwrap();

    let flat = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    assert_eq!(flat.count_hint(), Some(1));

    let recursive = FsImageSource::new(vec![dir.path().to_path_buf()], true);
    assert_eq!(recursive.count_hint(), Some(2));
}

#[test]
fn test_missing_path_yields_nothing() {
    let source = FsImageSource::new(vec!["/nonexistent/face.jpg".into()], false);
    assert_eq!(source.images().count(), 0);
}
