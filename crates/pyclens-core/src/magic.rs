//! Magic number ↔ version table.
//!
//! A pyc file starts with a little-endian `u16` magic followed by `\r\n`.
//! Each generation bumped the number several times during development; the
//! last value of each range is the one written by release interpreters.

use crate::{CoreError, CoreResult, Version};

/// `(first, last, version)`; `last` is the canonical release magic.
const MAGIC_RANGES: [(u16, u16, Version); 5] = [
    (3400, 3413, Version::V3_8),
    (3420, 3425, Version::V3_9),
    (3430, 3439, Version::V3_10),
    (3450, 3495, Version::V3_11),
    (3500, 3531, Version::V3_12),
];

/// Resolve the version from the first two bytes of a pyc file.
pub fn resolve_version(magic: &[u8]) -> CoreResult<Version> {
    let [lo, hi, ..] = magic else {
        return Err(CoreError::header("magic number needs 2 bytes"));
    };
    let number = u16::from_le_bytes([*lo, *hi]);
    MAGIC_RANGES
        .iter()
        .find(|(first, last, _)| (*first..=*last).contains(&number))
        .map(|&(_, _, version)| version)
        .ok_or(CoreError::UnknownMagicNumber { magic: number })
}

/// Canonical magic number written by the release interpreter of `version`.
pub fn magic_for(version: Version) -> CoreResult<u16> {
    MAGIC_RANGES
        .iter()
        .find(|(_, _, v)| *v == version)
        .map(|&(_, last, _)| last)
        .ok_or(CoreError::UnsupportedVersion { version })
}

/// The four header bytes (`magic` + `\r\n`) for `version`.
pub fn magic_bytes(version: Version) -> CoreResult<[u8; 4]> {
    let [lo, hi] = magic_for(version)?.to_le_bytes();
    Ok([lo, hi, b'\r', b'\n'])
}
