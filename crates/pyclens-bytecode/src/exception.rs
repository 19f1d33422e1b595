//! Table d'exceptions 3.11+ (`co_exceptiontable`).
//!
//! Each entry is four big-endian varints: start, length, target (all in code
//! units) and `depth << 1 | lasti`. A varint byte holds 6 value bits, bit 6
//! flags a continuation, and bit 7 marks the first byte of an entry.

use std::iter::FusedIterator;

#[cfg(feature = "serde")]
use serde::Serialize;

use pyclens_core::{profile_for, ByteReader, CoreError, CoreResult};
use pyclens_marshal::CodeUnit;

/// One protected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExceptionTableEntry {
    /// First covered byte offset.
    pub start: usize,
    /// Offset of the last covered instruction (inclusive).
    pub end: usize,
    /// Handler byte offset.
    pub target: usize,
    /// Value stack depth at handler entry.
    pub depth: u32,
    /// Whether the handler expects the faulting offset pushed.
    pub lasti: bool,
}

/// Iterator over an exception table's entries.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct ExceptionTable<'a> {
    table: &'a [u8],
    rd: ByteReader<'a>,
    failed: bool,
}

impl<'a> ExceptionTable<'a> {
    /// Cursor at the first entry.
    pub fn new(table: &'a [u8]) -> Self {
        Self { table, rd: ByteReader::new(table), failed: false }
    }

    /// Table vide (générations sans table d'exceptions).
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Every entry, decoded from the start.
    pub fn read_all(&self) -> CoreResult<Vec<ExceptionTableEntry>> {
        Self::new(self.table).collect()
    }

    fn read_varint(&mut self) -> CoreResult<u32> {
        let mut b = self.rd.read_u8()?;
        let mut val = u32::from(b & 63);
        while b & 64 != 0 {
            b = self.rd.read_u8()?;
            val = val
                .checked_mul(64)
                .ok_or_else(|| CoreError::malformed("co_exceptiontable", "varint overflows 32 bits"))?
                | u32::from(b & 63);
        }
        Ok(val)
    }

    fn read_entry(&mut self) -> CoreResult<ExceptionTableEntry> {
        let start = self.read_varint()? as usize;
        let length = self.read_varint()? as usize;
        let target = self.read_varint()? as usize;
        let depth_lasti = self.read_varint()?;
        let start = start * 2;
        Ok(ExceptionTableEntry {
            start,
            end: (start + length * 2).saturating_sub(2),
            target: target * 2,
            depth: depth_lasti >> 1,
            lasti: depth_lasti & 1 != 0,
        })
    }
}

impl Iterator for ExceptionTable<'_> {
    type Item = CoreResult<ExceptionTableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rd.is_empty() {
            return None;
        }
        let entry = self.read_entry();
        self.failed = entry.is_err();
        Some(entry)
    }
}

impl FusedIterator for ExceptionTable<'_> {}

/// Exception table of `code`; empty before 3.11.
pub fn exception_decoder(code: &CodeUnit) -> CoreResult<ExceptionTable<'_>> {
    let profile = profile_for(code.version)?;
    if !profile.has_exception_table {
        return Ok(ExceptionTable::empty());
    }
    Ok(ExceptionTable::new(&code.exceptiontable))
}
