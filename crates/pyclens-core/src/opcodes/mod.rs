//! Per-version opcode tables.
//!
//! Pure data: each table lists `(opcode, mnemonic, argument kind)` exactly as
//! the matching interpreter's `opcode` module defines them. The argument kind
//! drives how the disassembler resolves the raw argument.

mod py310;
mod py311;
mod py312;
mod py38;
mod py39;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::Version;

/// Opcodes at or above this value carry an argument byte.
pub const HAVE_ARGUMENT: u8 = 90;

/// Prefix word widening the next instruction's argument.
pub const EXTENDED_ARG: u8 = 144;

/// Inline cache slot (3.11+).
pub const CACHE: u8 = 0;

/// How an instruction's argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ArgKind {
    /// No special meaning (or no argument at all).
    Plain,
    /// Index into the constant pool.
    Const,
    /// Index into the name table.
    Name,
    /// Index into the local variable table.
    Local,
    /// Index into the cell/free variable table.
    Free,
    /// Jump relative to the end of the instruction.
    JumpRel,
    /// Absolute jump target.
    JumpAbs,
}

impl ArgKind {
    /// True for both jump flavours.
    pub const fn is_jump(self) -> bool {
        matches!(self, ArgKind::JumpRel | ArgKind::JumpAbs)
    }
}

/// One opcode table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OpInfo {
    /// Numeric opcode.
    pub code: u8,
    /// Mnemonic.
    pub name: &'static str,
    /// Argument interpretation.
    pub kind: ArgKind,
}

impl OpInfo {
    /// Whether the mnemonic marks a backward jump (`JUMP_BACKWARD*`, `POP_JUMP_BACKWARD_*`).
    pub fn is_backward_jump(&self) -> bool {
        self.name.contains("JUMP_BACKWARD")
    }
}

const fn row(code: u8, name: &'static str, kind: ArgKind) -> OpInfo {
    OpInfo { code, name, kind }
}

pub(crate) const fn def(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::Plain)
}

pub(crate) const fn name_op(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::Name)
}

pub(crate) const fn const_op(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::Const)
}

pub(crate) const fn local_op(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::Local)
}

pub(crate) const fn free_op(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::Free)
}

pub(crate) const fn jrel_op(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::JumpRel)
}

pub(crate) const fn jabs_op(code: u8, name: &'static str) -> OpInfo {
    row(code, name, ArgKind::JumpAbs)
}

/// Mnemonic table for one version.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeTable {
    version: Version,
    entries: &'static [OpInfo],
}

impl OpcodeTable {
    /// Version this table belongs to.
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Look up a numeric opcode.
    pub fn get(&self, code: u8) -> Option<&'static OpInfo> {
        self.entries.iter().find(|info| info.code == code)
    }

    /// Reverse lookup by mnemonic.
    pub fn by_name(&self, name: &str) -> Option<&'static OpInfo> {
        self.entries.iter().find(|info| info.name == name)
    }

    /// Every row, in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &'static OpInfo> {
        self.entries.iter()
    }

    /// Number of defined opcodes.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for the shipped tables.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 3.8 table.
pub static PY38: OpcodeTable = OpcodeTable { version: Version::V3_8, entries: py38::OPCODES };
/// 3.9 table.
pub static PY39: OpcodeTable = OpcodeTable { version: Version::V3_9, entries: py39::OPCODES };
/// 3.10 table.
pub static PY310: OpcodeTable = OpcodeTable { version: Version::V3_10, entries: py310::OPCODES };
/// 3.11 table.
pub static PY311: OpcodeTable = OpcodeTable { version: Version::V3_11, entries: py311::OPCODES };
/// 3.12 table.
pub static PY312: OpcodeTable = OpcodeTable { version: Version::V3_12, entries: py312::OPCODES };

/// Table for a supported version.
pub fn table_for(version: Version) -> Option<&'static OpcodeTable> {
    [&PY38, &PY39, &PY310, &PY311, &PY312].into_iter().find(|t| t.version == version)
}
