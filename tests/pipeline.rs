//! End-to-end pipeline tests against a temporary content root.

mod common;

use std::fs;

use common::{config, files_in, issue, png};
use issue2hugo::config::Config;
use issue2hugo::conversion::{ConversionIssueCode, Outcome, Pipeline, SkipReason, WriteMode};
use issue2hugo::diff::ChangeReason;
use issue2hugo::images::{FetchedImage, MemoryFetcher};
use issue2hugo::ir::io_event_json::from_event_str;
use issue2hugo::ir::INDEX_FILE;

const TAGGED_WITH_IMAGE: &str = "![x](https://e.com/y.jpg)\n\nHello\n\n$tech$ $life$";

fn converted(outcome: Outcome) -> issue2hugo::conversion::ConversionReport {
    match outcome {
        Outcome::Converted(report) => report,
        Outcome::Skipped { issue, reason } => panic!("#{issue} skipped: {}", reason.name()),
    }
}

#[test]
fn tagged_body_with_image_becomes_bundle() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new().with_image(
        "https://e.com/y.jpg",
        FetchedImage::new(b"\xFF\xD8\xFF\xE0jpeg".to_vec(), Some("image/jpeg")),
    );
    let pipeline = Pipeline::new(&config, &fetcher);

    let report = converted(
        pipeline
            .convert(&issue(12, TAGGED_WITH_IMAGE), WriteMode::Persist)
            .unwrap(),
    );

    assert_eq!(report.change.reason, ChangeReason::Created);
    assert!(report.written);
    assert_eq!(report.category.as_deref(), Some("tech"));
    assert_eq!(report.tags, vec!["tech", "life"]);

    let cover = report.cover.clone().expect("cover");
    assert!(cover.starts_with("image-1-") && cover.ends_with(".jpg"));
    assert_eq!(files_in(&report.dir), vec![cover.clone(), INDEX_FILE.to_string()]);

    let document = fs::read_to_string(report.dir.join(INDEX_FILE)).unwrap();
    let (yaml, body) = document
        .strip_prefix("---\n")
        .and_then(|rest| rest.split_once("---\n\n"))
        .expect("front matter fences");
    let front: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(front["title"].as_str(), Some("Hello"));
    assert_eq!(front["slug"].as_str(), Some("20240501_12"));
    assert_eq!(front["image"].as_str(), Some(cover.as_str()));
    assert_eq!(front["categories"][0].as_str(), Some("tech"));
    assert_eq!(
        body,
        format!("![x]({cover})\n\nHello\n"),
        "image rewritten and tag line stripped"
    );
}

#[test]
fn failed_fetch_keeps_remote_url_and_still_writes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let report = converted(
        pipeline
            .convert(&issue(12, TAGGED_WITH_IMAGE), WriteMode::Persist)
            .unwrap(),
    );

    assert!(report.written);
    assert!(report.cover.is_none());
    assert_eq!(report.images.failed, 1);
    assert!(report.has(ConversionIssueCode::ImageFetchFailed));
    assert_eq!(report.warning_count(), 1);

    let document = fs::read_to_string(report.dir.join(INDEX_FILE)).unwrap();
    assert!(document.contains("![x](https://e.com/y.jpg)"));
    assert!(!document.contains("image:"));
    assert_eq!(files_in(&report.dir), vec![INDEX_FILE.to_string()]);
}

#[test]
fn cover_is_first_resolved_image_in_body_order() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new()
        .with_image("https://e.com/b.png", png(2))
        .with_image("https://e.com/c.png", png(3));
    let pipeline = Pipeline::new(&config, &fetcher);

    let body = "![a](https://e.com/missing.png)\n![local](./local.png)\n![b](https://e.com/b.png)\n![c](https://e.com/c.png)";
    let report = converted(pipeline.convert(&issue(7, body), WriteMode::Persist).unwrap());

    let cover = report.cover.expect("cover");
    assert!(cover.starts_with("image-1-") && cover.ends_with(".png"));
    assert_eq!(report.images.found, 4);
    assert_eq!(report.images.downloaded, 2);
    assert_eq!(report.images.local, 1);
    assert_eq!(report.images.failed, 1);
}

#[test]
fn body_without_images_has_no_cover() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let prepared = pipeline.prepare(&issue(3, "Just words.\n\n$study$")).unwrap();
    assert!(prepared.record.cover.is_none());
    assert!(prepared.front_matter.image.is_none());
    assert!(prepared.bundle.images.is_empty());
}

#[test]
fn repeated_url_is_fetched_once() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new().with_image("https://e.com/a.png", png(1));
    let pipeline = Pipeline::new(&config, &fetcher);

    let body = "![one](https://e.com/a.png)\n\n![two](https://e.com/a.png)";
    let prepared = pipeline.prepare(&issue(5, body)).unwrap();

    assert_eq!(fetcher.requests("https://e.com/a.png"), 1);
    assert_eq!(prepared.bundle.images.len(), 1);
    let name = prepared.bundle.images.keys().next().unwrap();
    assert_eq!(prepared.record.body.matches(name.as_str()).count(), 2);
}

#[test]
fn images_inside_code_are_left_alone() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new().with_image("https://e.com/a.png", png(1));
    let pipeline = Pipeline::new(&config, &fetcher);

    let body = "```md\n![a](https://e.com/a.png)\n```\n\nInline `![a](https://e.com/a.png)` too.";
    let prepared = pipeline.prepare(&issue(5, body)).unwrap();

    assert_eq!(fetcher.requests("https://e.com/a.png"), 0);
    assert!(prepared.record.cover.is_none());
    assert_eq!(prepared.record.body, body);
}

#[test]
fn rerun_is_unchanged_and_writes_nothing() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new().with_image("https://e.com/y.jpg", png(9));
    let pipeline = Pipeline::new(&config, &fetcher);
    let issue = issue(12, TAGGED_WITH_IMAGE);

    let first = converted(pipeline.convert(&issue, WriteMode::Persist).unwrap());
    assert!(first.written);
    let cover_path = first.dir.join(first.cover.as_deref().unwrap());
    let index_path = first.dir.join(INDEX_FILE);
    let index_mtime = fs::metadata(&index_path).unwrap().modified().unwrap();
    let cover_mtime = fs::metadata(&cover_path).unwrap().modified().unwrap();

    let second = converted(pipeline.convert(&issue, WriteMode::Persist).unwrap());
    assert_eq!(second.change.reason, ChangeReason::Unchanged);
    assert!(!second.change.changed);
    assert!(!second.written);
    assert_eq!(fs::metadata(&index_path).unwrap().modified().unwrap(), index_mtime);
    assert_eq!(fs::metadata(&cover_path).unwrap().modified().unwrap(), cover_mtime);
}

#[test]
fn edited_body_is_content_change() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    pipeline
        .convert(&issue(12, "First draft.\n\n$tech$"), WriteMode::Persist)
        .unwrap();
    let report = converted(
        pipeline
            .convert(&issue(12, "Second draft.\n\n$tech$"), WriteMode::Persist)
            .unwrap(),
    );

    assert_eq!(report.change.reason, ChangeReason::ContentDiffers);
    assert!(report.written);
    let document = fs::read_to_string(report.dir.join(INDEX_FILE)).unwrap();
    assert!(document.contains("Second draft."));
}

#[test]
fn trailing_whitespace_edit_is_not_a_change() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    pipeline
        .convert(&issue(12, "Body.\n\n$tech$"), WriteMode::Persist)
        .unwrap();
    let report = converted(
        pipeline
            .convert(&issue(12, "Body.\r\n\r\n$tech$\r\n\r\n"), WriteMode::Persist)
            .unwrap(),
    );
    assert_eq!(report.change.reason, ChangeReason::Unchanged);
}

#[test]
fn deleted_image_on_disk_is_restored() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new().with_image("https://e.com/y.jpg", png(4));
    let pipeline = Pipeline::new(&config, &fetcher);
    let issue = issue(12, TAGGED_WITH_IMAGE);

    let first = converted(pipeline.convert(&issue, WriteMode::Persist).unwrap());
    let cover = first.cover.unwrap();
    fs::remove_file(first.dir.join(&cover)).unwrap();

    let second = converted(pipeline.convert(&issue, WriteMode::Persist).unwrap());
    assert_eq!(second.change.reason, ChangeReason::ImagesDiffer);
    assert_eq!(second.change.missing_images, vec![cover.clone()]);
    assert!(second.dir.join(&cover).is_file());
}

#[test]
fn replaced_image_prunes_stale_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let issue = issue(12, TAGGED_WITH_IMAGE);

    let old = MemoryFetcher::new().with_image("https://e.com/y.jpg", png(1));
    let first = converted(
        Pipeline::new(&config, &old)
            .convert(&issue, WriteMode::Persist)
            .unwrap(),
    );

    let new = MemoryFetcher::new().with_image("https://e.com/y.jpg", png(2));
    let second = converted(
        Pipeline::new(&config, &new)
            .convert(&issue, WriteMode::Persist)
            .unwrap(),
    );

    let old_cover = first.cover.unwrap();
    let new_cover = second.cover.unwrap();
    assert_ne!(old_cover, new_cover);
    assert_eq!(second.change.reason, ChangeReason::ContentDiffers);
    assert_eq!(
        files_in(&second.dir),
        vec![new_cover, INDEX_FILE.to_string()]
    );
}

#[test]
fn unrelated_files_in_bundle_are_kept() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let first = converted(
        pipeline
            .convert(&issue(12, "Body with ![d](diagram.svg)"), WriteMode::Persist)
            .unwrap(),
    );
    fs::write(first.dir.join("diagram.svg"), "<svg/>").unwrap();

    let second = converted(
        pipeline
            .convert(&issue(12, "Body with ![d](diagram.svg)"), WriteMode::Persist)
            .unwrap(),
    );
    assert_eq!(second.change.reason, ChangeReason::Unchanged);
    assert!(second.dir.join("diagram.svg").is_file());
}

#[test]
fn user_image_with_image_prefix_is_kept() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);
    let body = "See ![d](image-diagram.png)";

    let first = converted(pipeline.convert(&issue(12, body), WriteMode::Persist).unwrap());
    fs::write(first.dir.join("image-diagram.png"), common::png_bytes(1)).unwrap();

    let second = converted(pipeline.convert(&issue(12, body), WriteMode::Persist).unwrap());
    assert_eq!(second.change.reason, ChangeReason::Unchanged);
    assert!(!second.written);
    assert!(second.dir.join("image-diagram.png").is_file());
}

#[test]
fn html_img_becomes_local_cover() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new().with_image("https://e.com/shot.png", png(4));
    let pipeline = Pipeline::new(&config, &fetcher);

    let body = r#"<img width="480" alt="Screenshot" src="https://e.com/shot.png">"#;
    let report = converted(pipeline.convert(&issue(3, body), WriteMode::Persist).unwrap());

    let cover = report.cover.clone().expect("cover");
    assert_eq!(report.images.downloaded, 1);
    assert_eq!(files_in(&report.dir), vec![cover.clone(), INDEX_FILE.to_string()]);
    let document = fs::read_to_string(report.dir.join(INDEX_FILE)).unwrap();
    assert!(document.contains(&format!(r#"<img width="480" alt="Screenshot" src="{cover}">"#)));
    assert!(document.contains(&format!("image: {cover}")));
}

#[test]
fn non_utf8_index_is_rewritten() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let first = converted(pipeline.convert(&issue(12, "Hello"), WriteMode::Persist).unwrap());
    let index = first.dir.join(INDEX_FILE);
    fs::write(&index, b"---\ntitle: \xFF\xFE\n---\n").unwrap();

    let second = converted(pipeline.convert(&issue(12, "Hello"), WriteMode::Persist).unwrap());
    assert_eq!(second.change.reason, ChangeReason::ContentDiffers);
    assert!(second.written);
    let document = fs::read_to_string(&index).expect("index.md is valid UTF-8 again");
    assert!(document.ends_with("Hello\n"));
}

#[test]
fn empty_title_uses_fallback() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let mut untitled = issue(42, "Body");
    untitled.title = "   ".to_string();
    let report = converted(pipeline.convert(&untitled, WriteMode::Persist).unwrap());

    assert_eq!(report.title, "issue-42");
    assert!(report.has(ConversionIssueCode::TitleFallback));
    let document = fs::read_to_string(report.dir.join(INDEX_FILE)).unwrap();
    assert!(document.contains("issue-42"));
}

#[test]
fn tag_line_followed_by_prose_is_body_text() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let prepared = pipeline
        .prepare(&issue(1, "$a$ $b$\n\nTrailing prose."))
        .unwrap();
    assert!(prepared.record.tags.is_empty());
    assert!(prepared.record.body.starts_with("$a$ $b$"));

    let prepared = pipeline.prepare(&issue(1, "Prose.\n\n$a$ $b$")).unwrap();
    assert_eq!(prepared.record.tags, vec!["a", "b"]);
}

#[test]
fn category_tag_stays_in_tags() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let prepared = pipeline.prepare(&issue(1, "Prose.\n\n$rust$ $study$")).unwrap();
    assert_eq!(prepared.record.category.as_deref(), Some("study"));
    assert_eq!(prepared.record.tags, vec!["rust", "study"]);
    assert_eq!(prepared.front_matter.categories, vec!["study"]);
}

#[test]
fn tag_line_in_code_block_is_noted() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    // The fence is never closed, so it runs to the end of the body.
    let body = "Template:\n\n```\n$a$ $b$";
    let prepared = pipeline.prepare(&issue(1, body)).unwrap();
    assert!(prepared.record.tags.is_empty());
    assert_eq!(prepared.record.body, body);
    assert!(prepared
        .issues
        .iter()
        .any(|i| i.code == ConversionIssueCode::TagLineInCodeBlock));
}

#[test]
fn self_triggered_event_short_circuits() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = Config {
        bot_login: "blog-bot".to_string(),
        ..config(temp.path())
    };
    let fetcher = MemoryFetcher::new().with_image("https://e.com/y.jpg", png(1));
    let pipeline = Pipeline::new(&config, &fetcher);

    let mut bot = issue(12, TAGGED_WITH_IMAGE);
    bot.author = "blog-bot".to_string();
    let outcome = pipeline.convert(&bot, WriteMode::Persist).unwrap();

    assert!(matches!(
        outcome,
        Outcome::Skipped {
            reason: SkipReason::SelfTriggered,
            ..
        }
    ));
    assert_eq!(fetcher.requests("https://e.com/y.jpg"), 0);
    assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
}

#[test]
fn sweep_isolates_failures() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    // A regular file where issue 12's bundle directory should go.
    fs::write(temp.path().join("20240501_12"), "in the way").unwrap();

    let issues = vec![issue(12, "Blocked."), issue(13, "Fine.")];
    let summary = pipeline.sweep(&issues, WriteMode::Persist);

    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].issue.as_u64(), 12);
    assert_eq!(summary.converted, 1);
    assert!(temp.path().join("20240501_13").join(INDEX_FILE).is_file());
}

#[test]
fn webhook_payload_converts() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = config(temp.path());
    let fetcher = MemoryFetcher::new();
    let pipeline = Pipeline::new(&config, &fetcher);

    let events = from_event_str(
        r#"{
            "action": "opened",
            "issue": {
                "number": 8,
                "title": "From a webhook",
                "body": "Line one\r\nLine two\r\n\r\n$life$",
                "user": {"login": "carol"},
                "labels": [{"name": "publish"}, {"name": "tech"}],
                "state": "open",
                "created_at": "2024-12-31T23:59:59Z"
            }
        }"#,
    )
    .unwrap();

    let report = converted(pipeline.convert(&events[0], WriteMode::Persist).unwrap());
    assert_eq!(report.dir, temp.path().join("20241231_8"));
    assert_eq!(report.category.as_deref(), Some("life"));
    assert!(!report.has(ConversionIssueCode::CategoryFromLabel));
}
