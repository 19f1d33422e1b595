//! Version profiles : une description figée par génération.
//!
//! A profile is selected once from a resolved [`Version`] and passed to every
//! later decoding step; nothing downstream inspects the version number again.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::opcodes::{self, OpcodeTable, CACHE};
use crate::{CoreError, CoreResult, Version};

/// Field order of a serialized code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CodeLayout {
    /// `nlocals` + separate `varnames` / `freevars` / `cellvars` (3.8 to 3.10).
    Split,
    /// `localsplusnames` / `localspluskinds`, `qualname`, exception table (3.11+).
    Unified,
}

/// Encoding of the source position side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PositionFormat {
    /// `co_lnotab` pairs, line applied once the offset threshold is crossed.
    Lnotab,
    /// 3.10 `co_linetable` pairs, line applied when the pair is read.
    Linetable310,
    /// 3.11+ location table with columns.
    Locations,
}

/// How jump arguments become byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum JumpRule {
    /// Arguments are byte counts; relative jumps add to the end offset.
    ByteRelative,
    /// Arguments are word counts; relative jumps add (or subtract) from the end offset.
    WordRelative,
    /// Absolute jumps are word counts; relative jumps stay raw.
    WordAbsoluteOnly,
}

/// Everything generation-specific the decoders need.
#[derive(Debug, Clone, Copy)]
pub struct VersionProfile {
    /// Interpreter version.
    pub version: Version,
    /// Mnemonic table.
    pub opcodes: &'static OpcodeTable,
    /// Code unit field order.
    pub layout: CodeLayout,
    /// Position table variant.
    pub position_format: PositionFormat,
    /// Whether code units carry an exception table.
    pub has_exception_table: bool,
    /// Inline cache pseudo-opcode, if any.
    pub cache_opcode: Option<u8>,
    /// Jump target computation.
    pub jump_rule: JumpRule,
    /// Name-index right shifts for mnemonics whose low bits are flags.
    pub name_shifts: &'static [(&'static str, u32)],
}

impl VersionProfile {
    /// Right shift to apply before using `mnemonic`'s argument as a name index.
    pub fn name_shift(&self, mnemonic: &str) -> u32 {
        self.name_shifts
            .iter()
            .find(|(name, _)| *name == mnemonic)
            .map_or(0, |&(_, shift)| shift)
    }

    /// True if `opcode` is this generation's inline cache slot.
    pub fn is_cache(&self, opcode: u8) -> bool {
        self.cache_opcode == Some(opcode)
    }
}

/* ─────────────────────────── Profils ─────────────────────────── */

const SHIFTS_311: &[(&str, u32)] = &[("LOAD_GLOBAL", 1)];
const SHIFTS_312: &[(&str, u32)] = &[("LOAD_GLOBAL", 1), ("LOAD_ATTR", 1), ("LOAD_SUPER_ATTR", 2)];

/// 3.8
pub static PROFILE_38: VersionProfile = VersionProfile {
    version: Version::V3_8,
    opcodes: &opcodes::PY38,
    layout: CodeLayout::Split,
    position_format: PositionFormat::Lnotab,
    has_exception_table: false,
    cache_opcode: None,
    jump_rule: JumpRule::ByteRelative,
    name_shifts: &[],
};

/// 3.9
pub static PROFILE_39: VersionProfile = VersionProfile {
    version: Version::V3_9,
    opcodes: &opcodes::PY39,
    layout: CodeLayout::Split,
    position_format: PositionFormat::Lnotab,
    has_exception_table: false,
    cache_opcode: None,
    jump_rule: JumpRule::ByteRelative,
    name_shifts: &[],
};

/// 3.10
pub static PROFILE_310: VersionProfile = VersionProfile {
    version: Version::V3_10,
    opcodes: &opcodes::PY310,
    layout: CodeLayout::Split,
    position_format: PositionFormat::Linetable310,
    has_exception_table: false,
    cache_opcode: None,
    jump_rule: JumpRule::WordRelative,
    name_shifts: &[],
};

/// 3.11
pub static PROFILE_311: VersionProfile = VersionProfile {
    version: Version::V3_11,
    opcodes: &opcodes::PY311,
    layout: CodeLayout::Unified,
    position_format: PositionFormat::Locations,
    has_exception_table: true,
    cache_opcode: Some(CACHE),
    jump_rule: JumpRule::WordAbsoluteOnly,
    name_shifts: SHIFTS_311,
};

/// 3.12
pub static PROFILE_312: VersionProfile = VersionProfile {
    version: Version::V3_12,
    opcodes: &opcodes::PY312,
    layout: CodeLayout::Unified,
    position_format: PositionFormat::Locations,
    has_exception_table: true,
    cache_opcode: Some(CACHE),
    jump_rule: JumpRule::WordAbsoluteOnly,
    name_shifts: SHIFTS_312,
};

/// Profile for `version`, or [`CoreError::UnsupportedVersion`].
pub fn profile_for(version: Version) -> CoreResult<&'static VersionProfile> {
    [&PROFILE_38, &PROFILE_39, &PROFILE_310, &PROFILE_311, &PROFILE_312]
        .into_iter()
        .find(|p| p.version == version)
        .ok_or(CoreError::UnsupportedVersion { version })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_version_has_a_profile() -> CoreResult<()> {
        for version in Version::SUPPORTED {
            let profile = profile_for(version)?;
            assert_eq!(profile.version, version);
            assert_eq!(profile.opcodes.version(), version);
        }
        Ok(())
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = profile_for(Version::new(3, 7)).unwrap_err();
        assert_eq!(err, CoreError::UnsupportedVersion { version: Version::new(3, 7) });
    }

    #[test]
    fn generation_traits() -> CoreResult<()> {
        let p310 = profile_for(Version::V3_10)?;
        assert_eq!(p310.layout, CodeLayout::Split);
        assert_eq!(p310.position_format, PositionFormat::Linetable310);
        assert!(!p310.has_exception_table);
        assert!(!p310.is_cache(0));

        let p311 = profile_for(Version::V3_11)?;
        assert_eq!(p311.layout, CodeLayout::Unified);
        assert!(p311.has_exception_table);
        assert!(p311.is_cache(CACHE));
        Ok(())
    }

    #[test]
    fn name_shifts_by_generation() -> CoreResult<()> {
        assert_eq!(profile_for(Version::V3_10)?.name_shift("LOAD_GLOBAL"), 0);
        assert_eq!(profile_for(Version::V3_11)?.name_shift("LOAD_GLOBAL"), 1);
        assert_eq!(profile_for(Version::V3_11)?.name_shift("LOAD_ATTR"), 0);
        assert_eq!(profile_for(Version::V3_12)?.name_shift("LOAD_ATTR"), 1);
        assert_eq!(profile_for(Version::V3_12)?.name_shift("LOAD_SUPER_ATTR"), 2);
        Ok(())
    }
}
