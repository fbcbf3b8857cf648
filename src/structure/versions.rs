//! Version identities and the version bundle.
//!
//! # Responsibilities
//! - Date-based version tags, ordered chronologically
//! - Group version changes under the version they took effect at
//! - Hold the full, newest-first sequence of versions for a run
//!
//! # Design Decisions
//! - Versions are calendar dates (Stripe-style), not semver
//! - The bundle is immutable and shared read-only across generation
//! - Newest-first ordering is validated at construction, not assumed

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::structure::changes::VersionChange;

/// A point in the API's chronology, identified by a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(pub NaiveDate);

impl ApiVersion {
    /// Create a version from year, month and day.
    ///
    /// Panics on an invalid calendar date, mirroring `NaiveDate` construction
    /// in the builder-style setup code where this is used.
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(year, month, day).expect("invalid version date"))
    }

    /// Parse an ISO `YYYY-MM-DD` version tag.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }

    /// Directory name of this version's schema variants, e.g. `v2021_01_01`.
    pub fn dir_name(&self) -> String {
        self.0.format("v%Y_%m_%d").to_string()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// One version: a date tag plus the version changes active as of that date.
#[derive(Debug, Clone)]
pub struct Version {
    /// The chronological tag.
    pub value: ApiVersion,
    /// Changes describing the difference between this version and the one
    /// before it. Empty for the very first version.
    pub changes: Vec<Arc<VersionChange>>,
}

impl Version {
    /// A version with no changes attached (typically the oldest one).
    pub fn unchanged(value: ApiVersion) -> Self {
        Self {
            value,
            changes: Vec::new(),
        }
    }

    /// A version with the given changes.
    pub fn with_changes(value: ApiVersion, changes: Vec<VersionChange>) -> Self {
        Self {
            value,
            changes: changes.into_iter().map(Arc::new).collect(),
        }
    }
}

/// The full ordered sequence of versions, newest first.
///
/// Shared read-only by the generator across the whole run.
#[derive(Debug, Clone)]
pub struct VersionBundle {
    versions: Vec<Version>,
}

impl VersionBundle {
    /// Build a bundle from versions ordered newest-first.
    ///
    /// Fails if the sequence is empty or not strictly descending.
    pub fn new(versions: Vec<Version>) -> Result<Self, GenerationError> {
        if versions.is_empty() {
            return Err(GenerationError::EmptyBundle);
        }
        for pair in versions.windows(2) {
            if pair[0].value <= pair[1].value {
                return Err(GenerationError::VersionsNotDescending {
                    earlier: pair[1].value,
                    later: pair[0].value,
                });
            }
        }
        Ok(Self { versions })
    }

    /// Iterate versions newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    /// The newest version in the bundle.
    pub fn latest(&self) -> &Version {
        &self.versions[0]
    }

    /// The oldest version in the bundle.
    pub fn oldest(&self) -> &Version {
        &self.versions[self.versions.len() - 1]
    }

    /// Number of versions.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the bundle is empty. Always false for a constructed bundle.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display_and_dir_name() {
        let v = ApiVersion::new(2021, 1, 1);
        assert_eq!(v.to_string(), "2021-01-01");
        assert_eq!(v.dir_name(), "v2021_01_01");
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(ApiVersion::parse("2021-01-01"), Some(ApiVersion::new(2021, 1, 1)));
        assert_eq!(ApiVersion::parse("not-a-date"), None);
    }

    #[test]
    fn test_bundle_orders_newest_first() {
        let bundle = VersionBundle::new(vec![
            Version::unchanged(ApiVersion::new(2021, 1, 1)),
            Version::unchanged(ApiVersion::new(2000, 1, 1)),
        ])
        .unwrap();
        assert_eq!(bundle.latest().value, ApiVersion::new(2021, 1, 1));
        assert_eq!(bundle.oldest().value, ApiVersion::new(2000, 1, 1));
    }

    #[test]
    fn test_bundle_rejects_ascending_order() {
        let err = VersionBundle::new(vec![
            Version::unchanged(ApiVersion::new(2000, 1, 1)),
            Version::unchanged(ApiVersion::new(2021, 1, 1)),
        ])
        .unwrap_err();
        assert!(matches!(err, GenerationError::VersionsNotDescending { .. }));
    }

    #[test]
    fn test_bundle_rejects_empty() {
        let err = VersionBundle::new(Vec::new()).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyBundle));
    }
}
