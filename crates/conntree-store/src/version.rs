//! Store schema versions
//!
//! Versions are stored as text (`2.7`, `2.7.1`) and compared numerically.
//! This client reads a closed range of versions and never upgrades a store.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// Ordered schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl SchemaVersion {
    /// Version written by this client
    pub const CURRENT: Self = Self::new(2, 7, 0);

    /// Create a version
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Major component
    #[inline]
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// Minor component
    #[inline]
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparsable = || VersionError::Unparsable(s.to_string());
        let parts = s
            .trim()
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| unparsable())?;
        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(unparsable()),
        }
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(value: SchemaVersion) -> Self {
        value.to_string()
    }
}

/// Checks store versions against the supported range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionVerifier {
    min: SchemaVersion,
    max: SchemaVersion,
}

impl VersionVerifier {
    /// Verifier accepting only [`SchemaVersion::CURRENT`]
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min: SchemaVersion::CURRENT,
            max: SchemaVersion::CURRENT,
        }
    }

    /// Verifier accepting `min..=max`
    ///
    /// Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn with_range(min: SchemaVersion, max: SchemaVersion) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lowest supported version
    #[inline]
    #[must_use]
    pub const fn min(&self) -> SchemaVersion {
        self.min
    }

    /// Highest supported version
    #[inline]
    #[must_use]
    pub const fn max(&self) -> SchemaVersion {
        self.max
    }

    /// Check a version as stored
    ///
    /// # Errors
    /// - [`VersionError::Unparsable`] if the text is not a version
    /// - [`VersionError::Unsupported`] if it is outside the range
    pub fn verify_database_version(&self, version: &str) -> Result<SchemaVersion, VersionError> {
        let parsed: SchemaVersion = version.parse()?;
        self.verify(parsed)?;
        Ok(parsed)
    }

    /// Check a parsed version
    ///
    /// # Errors
    /// [`VersionError::Unsupported`] if outside the range
    pub fn verify(&self, version: SchemaVersion) -> Result<(), VersionError> {
        if (self.min..=self.max).contains(&version) {
            Ok(())
        } else {
            Err(VersionError::Unsupported {
                found: version,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for VersionVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_and_three_components() {
        assert_eq!("2.7".parse::<SchemaVersion>().unwrap(), SchemaVersion::new(2, 7, 0));
        assert_eq!(" 2.7.1 ".parse::<SchemaVersion>().unwrap(), SchemaVersion::new(2, 7, 1));
        assert!("2".parse::<SchemaVersion>().is_err());
        assert!("2.x".parse::<SchemaVersion>().is_err());
        assert!("".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn ordering_is_numeric() {
        let a: SchemaVersion = "2.10".parse().unwrap();
        let b: SchemaVersion = "2.9".parse().unwrap();
        assert!(a > b);
    }

    #[test]
    fn display_omits_zero_patch() {
        assert_eq!(SchemaVersion::CURRENT.to_string(), "2.7");
        assert_eq!(SchemaVersion::new(2, 7, 3).to_string(), "2.7.3");
    }

    #[test]
    fn current_version_is_accepted() {
        let verifier = VersionVerifier::new();
        assert_eq!(verifier.verify_database_version("2.7"), Ok(SchemaVersion::CURRENT));
    }

    #[test]
    fn newer_version_is_rejected() {
        let verifier = VersionVerifier::new();
        let err = verifier.verify_database_version("2.8").unwrap_err();
        assert_eq!(
            err,
            VersionError::Unsupported {
                found: SchemaVersion::new(2, 8, 0),
                min: SchemaVersion::CURRENT,
                max: SchemaVersion::CURRENT,
            }
        );
    }

    #[test]
    fn garbage_version_is_rejected() {
        let err = VersionVerifier::new().verify_database_version("latest").unwrap_err();
        assert_eq!(err, VersionError::Unparsable("latest".to_string()));
    }

    #[test]
    fn range_bounds_are_inclusive_and_normalised() {
        let verifier =
            VersionVerifier::with_range(SchemaVersion::new(2, 7, 0), SchemaVersion::new(2, 5, 0));
        assert_eq!(verifier.min(), SchemaVersion::new(2, 5, 0));
        assert!(verifier.verify(SchemaVersion::new(2, 5, 0)).is_ok());
        assert!(verifier.verify(SchemaVersion::new(2, 6, 4)).is_ok());
        assert!(verifier.verify(SchemaVersion::new(2, 4, 9)).is_err());
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&SchemaVersion::CURRENT).unwrap();
        assert_eq!(json, "\"2.7\"");
        let back: SchemaVersion = serde_json::from_str("\"2.6.1\"").unwrap();
        assert_eq!(back, SchemaVersion::new(2, 6, 1));
    }
}
