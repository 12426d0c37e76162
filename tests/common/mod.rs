#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use issue2hugo::config::Config;
use issue2hugo::images::FetchedImage;
use issue2hugo::ir::IssueEvent;
use issue2hugo::tags::CategoryVocabulary;

/// Smallest valid PNG signature plus IHDR chunk, enough for magic detection.
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes.extend_from_slice(&[seed, seed, seed, seed]);
    bytes
}

pub fn png(seed: u8) -> FetchedImage {
    FetchedImage::new(png_bytes(seed), Some("image/png"))
}

/// A publishable open issue created on 2024-05-01.
pub fn issue(number: u64, body: &str) -> IssueEvent {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    IssueEvent::new(number, "Hello", body, "alice", created).with_labels(["publish"])
}

pub fn config(root: &Path) -> Config {
    Config {
        categories: CategoryVocabulary::new(["life", "tech", "study"]),
        output_root: root.to_path_buf(),
        ..Config::default()
    }
}

/// Sorted file names in a bundle directory.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read bundle dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
