#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Prose lines that never look like tags, images or code fences.
pub fn arb_prose(max_lines: usize) -> BoxedStrategy<String> {
    proptest::collection::vec(
        proptest::string::string_regex("[A-Za-z][a-z ,.]{0,30}").expect("valid prose regex"),
        1..=max_lines,
    )
    .prop_map(|lines| lines.join("\n"))
    .boxed()
}

pub fn arb_tag() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z][a-z0-9-]{0,9}")
        .expect("valid tag regex")
        .boxed()
}

pub fn arb_tags(max: usize) -> BoxedStrategy<Vec<String>> {
    proptest::collection::vec(arb_tag(), 1..=max).boxed()
}

/// Remote image URLs on a fixed host.
pub fn arb_image_url() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z]{1,8}")
        .expect("valid image name regex")
        .prop_map(|name| format!("https://img.example.com/{name}.png"))
        .boxed()
}

pub fn tag_line(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("${t}$"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First occurrence order, repeats dropped.
pub fn dedup(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}
