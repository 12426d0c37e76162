//! Fuzz target for tag line extraction.
//!
//! Bodies are arbitrary UTF-8; the extractor must never panic and must never
//! grow the body.

#![no_main]

use libfuzzer_sys::fuzz_target;
use issue2hugo::tags::{CategoryVocabulary, TagExtractor};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    let extractor = TagExtractor::new(CategoryVocabulary::new(["life", "tech"]));
    let extraction = extractor.extract(body);
    assert!(extraction.body.len() <= body.len());
    if let Some(category) = extraction.category {
        assert!(extraction.tags.contains(&category));
    }
});
