//! Change detection between a fresh bundle and what is on disk.
//!
//! The document is compared byte for byte. Images are compared by file name
//! only; since resolver file names embed a content hash, a changed image
//! still shows up as a different name.

mod report;

pub use report::{ChangeReason, ChangeReport};

use crate::ir::{ExistingBundle, OutputBundle};

/// Decides whether `bundle` needs to be written over `existing`.
///
/// `None` (or a directory without `index.md`) means no prior state.
pub fn detect_changes(bundle: &OutputBundle, existing: Option<&ExistingBundle>) -> ChangeReport {
    let Some(existing) = existing else {
        return ChangeReport::new(ChangeReason::Created);
    };
    let Some(document) = existing.document.as_deref() else {
        return ChangeReport::new(ChangeReason::Created);
    };

    let missing_images: Vec<String> = bundle
        .images
        .keys()
        .filter(|name| !existing.files.contains(*name))
        .cloned()
        .collect();
    let stale_images: Vec<String> = existing
        .image_files()
        .filter(|name| !bundle.images.contains_key(*name))
        .map(str::to_string)
        .collect();

    let reason = if document != bundle.document.as_bytes() {
        ChangeReason::ContentDiffers
    } else if !missing_images.is_empty() || !stale_images.is_empty() {
        ChangeReason::ImagesDiffer
    } else {
        ChangeReason::Unchanged
    };

    ChangeReport {
        missing_images,
        stale_images,
        ..ChangeReport::new(reason)
    }
}
