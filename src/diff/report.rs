//! Change report types and text formatting.

use serde::Serialize;
use std::fmt;

/// Why a bundle does or does not need to be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// No prior `index.md` at the target directory.
    Created,
    /// The rendered document differs byte-wise.
    ContentDiffers,
    /// The document matches but the set of image files does not.
    ImagesDiffer,
    /// Nothing to write.
    Unchanged,
}

impl ChangeReason {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeReason::Created => "created",
            ChangeReason::ContentDiffers => "content differs",
            ChangeReason::ImagesDiffer => "images differ",
            ChangeReason::Unchanged => "unchanged",
        }
    }
}

/// Change detector output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub changed: bool,
    pub reason: ChangeReason,
    /// Images the bundle needs that are not on disk.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_images: Vec<String>,
    /// Resolver images on disk that the bundle no longer references.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale_images: Vec<String>,
}

impl ChangeReport {
    pub fn new(reason: ChangeReason) -> Self {
        Self {
            changed: reason != ChangeReason::Unchanged,
            reason,
            missing_images: Vec::new(),
            stale_images: Vec::new(),
        }
    }
}

impl fmt::Display for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason.name())?;
        if !self.missing_images.is_empty() {
            write!(f, " (missing: {})", self.missing_images.join(", "))?;
        }
        if !self.stale_images.is_empty() {
            write!(f, " (stale: {})", self.stale_images.join(", "))?;
        }
        Ok(())
    }
}
