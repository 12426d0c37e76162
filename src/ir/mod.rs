//! Content model for issue2hugo.
//!
//! This module defines the records that flow through the pipeline, from the
//! immutable [`IssueEvent`] read off a GitHub payload to the rendered
//! [`OutputBundle`] that is compared against disk.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use issue2hugo::ir::IssueEvent;
//!
//! let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
//! let issue = IssueEvent::new(12u64, "First post", "Hello", "alice", created)
//!     .with_labels(["publish"]);
//! assert_eq!(issue.slug(), "20240501_12");
//! ```

mod ids;
pub mod io_event_json;
pub mod io_hugo;
mod model;

// Re-export core types for convenient access
pub use ids::IssueNumber;
pub use model::{
    bundle_slug, is_managed_image, ContentRecord, ExistingBundle, ImageReference, IssueEvent,
    IssueState, OutputBundle, IMAGE_PREFIX, INDEX_FILE,
};
