//! Tables de positions : offset d'instruction → ligne (et colonnes en 3.11+).
//!
//! Three encodings exist, one per [`PositionFormat`]. They all behave as a
//! pull cursor: `get` must be called with non-decreasing offsets, and
//! `read_all` replays the whole table on a fresh cursor.

mod lnotab;
mod locations;

#[cfg(feature = "serde")]
use serde::Serialize;

use pyclens_core::{profile_for, CoreResult, PositionFormat};
use pyclens_marshal::CodeUnit;

pub use lnotab::{Linetable310Reader, LnotabReader};
pub use locations::LocationTableReader;

/// Position information for one instruction (or one table entry).
///
/// Absent fields hold `-1`: columns and end line before 3.11, everything
/// for "no location" entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PositionEntry {
    /// Byte offset the entry was produced for.
    pub offset: usize,
    /// Source line.
    pub line: i32,
    /// Last source line.
    pub end_line: i32,
    /// Start column (0-based).
    pub col: i32,
    /// End column (0-based, exclusive).
    pub end_col: i32,
}

impl PositionEntry {
    /// Entrée sans colonnes.
    pub const fn line_only(offset: usize, line: i32) -> Self {
        Self { offset, line, end_line: -1, col: -1, end_col: -1 }
    }
}

/// Pull cursor over a position table.
pub trait PositionDecoder {
    /// Position of the instruction at byte `offset`.
    ///
    /// Offsets must not decrease between calls; going backwards yields
    /// [`CoreError::PositionRewind`](pyclens_core::CoreError::PositionRewind).
    fn get(&mut self, offset: usize) -> CoreResult<PositionEntry>;

    /// Every entry of the table, decoded from the start on a fresh cursor.
    fn read_all(&self) -> CoreResult<Vec<PositionEntry>>;
}

/// Decoder picked for a code unit's version.
#[derive(Debug, Clone)]
pub enum PositionTable<'a> {
    /// 3.8 / 3.9 `co_lnotab`.
    Lnotab(LnotabReader<'a>),
    /// 3.10 `co_linetable`.
    Linetable310(Linetable310Reader<'a>),
    /// 3.11+ location table.
    Locations(LocationTableReader<'a>),
}

impl PositionDecoder for PositionTable<'_> {
    fn get(&mut self, offset: usize) -> CoreResult<PositionEntry> {
        match self {
            PositionTable::Lnotab(r) => r.get(offset),
            PositionTable::Linetable310(r) => r.get(offset),
            PositionTable::Locations(r) => r.get(offset),
        }
    }

    fn read_all(&self) -> CoreResult<Vec<PositionEntry>> {
        match self {
            PositionTable::Lnotab(r) => r.read_all(),
            PositionTable::Linetable310(r) => r.read_all(),
            PositionTable::Locations(r) => r.read_all(),
        }
    }
}

/// Build the position decoder matching `code`'s version.
pub fn position_decoder(code: &CodeUnit) -> CoreResult<PositionTable<'_>> {
    let profile = profile_for(code.version)?;
    let table: &[u8] = &code.linetable;
    log::trace!(
        "position table for {}: {:?}, {} bytes",
        code.display_name(),
        profile.position_format,
        table.len()
    );
    Ok(match profile.position_format {
        PositionFormat::Lnotab => PositionTable::Lnotab(LnotabReader::new(table, code.first_line)),
        PositionFormat::Linetable310 => {
            PositionTable::Linetable310(Linetable310Reader::new(table, code.first_line))
        }
        PositionFormat::Locations => {
            PositionTable::Locations(LocationTableReader::new(table, code.first_line))
        }
    })
}

/// Suivi de la monotonie des requêtes.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Monotonic {
    last: Option<usize>,
}

impl Monotonic {
    pub(crate) fn check(&mut self, offset: usize) -> CoreResult<()> {
        if let Some(current) = self.last {
            if offset < current {
                return Err(pyclens_core::CoreError::PositionRewind { requested: offset, current });
            }
        }
        self.last = Some(offset);
        Ok(())
    }
}
