//! Semantic version gate for dependency versions.

use crate::error::VersionError;
use semver::{Comparator, Op, Version, VersionReq};
use std::fmt;

/// Wraps a component's own version and checks other versions against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionManager {
    version: Version,
}

impl VersionManager {
    /// Create a manager for `version`, which must be a valid semantic version.
    pub fn new(version: &str) -> Result<Self, VersionError> {
        let version =
            Version::parse(version).map_err(|_| VersionError::Invalid(version.to_string()))?;
        Ok(Self { version })
    }

    /// The stored version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// True iff `version` satisfies the caret range `^<stored version>`.
    ///
    /// Unparsable input is never compatible.
    pub fn is_minor_same_or_newer(&self, version: &str) -> bool {
        let Ok(candidate) = Version::parse(version) else {
            return false;
        };
        self.caret_range().matches(&candidate)
    }

    // Built from parts since a range string cannot carry build metadata.
    fn caret_range(&self) -> VersionReq {
        VersionReq {
            comparators: vec![Comparator {
                op: Op::Caret,
                major: self.version.major,
                minor: Some(self.version.minor),
                patch: Some(self.version.patch),
                pre: self.version.pre.clone(),
            }],
        }
    }
}

impl fmt::Display for VersionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}
