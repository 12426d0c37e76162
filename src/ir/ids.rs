//! Newtype identifiers for issues.
//!
//! Keeps issue numbers from being confused with positions, counts or other
//! bare integers that flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A GitHub issue number, unique within a repository.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(pub u64);

impl IssueNumber {
    /// Creates a new IssueNumber.
    #[inline]
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for IssueNumber {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

impl fmt::Debug for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssueNumber({})", self.0)
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
