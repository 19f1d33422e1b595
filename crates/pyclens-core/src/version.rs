//! Interpreter versions.

use core::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A `(major, minor)` interpreter version.
///
/// Fixed once per code unit; every later decode decision is keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Version {
    /// Major version (always 3 for supported inputs).
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl Version {
    /// 3.8
    pub const V3_8: Self = Self::new(3, 8);
    /// 3.9
    pub const V3_9: Self = Self::new(3, 9);
    /// 3.10
    pub const V3_10: Self = Self::new(3, 10);
    /// 3.11
    pub const V3_11: Self = Self::new(3, 11);
    /// 3.12
    pub const V3_12: Self = Self::new(3, 12);

    /// Every supported generation, oldest first.
    pub const SUPPORTED: [Self; 5] = [Self::V3_8, Self::V3_9, Self::V3_10, Self::V3_11, Self::V3_12];

    /// Crée une version.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Whether this is one of the supported generations.
    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl From<(u8, u8)> for Version {
    fn from((major, minor): (u8, u8)) -> Self {
        Self::new(major, minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_by_minor() {
        assert!(Version::V3_9 < Version::V3_10);
        assert!(Version::V3_12 > Version::V3_11);
        assert_eq!(Version::from((3, 10)), Version::V3_10);
        assert_eq!(Version::V3_10.to_string(), "3.10");
    }

    #[test]
    fn supported_range() {
        assert!(Version::V3_8.is_supported());
        assert!(!Version::new(3, 7).is_supported());
        assert!(!Version::new(3, 13).is_supported());
    }
}
