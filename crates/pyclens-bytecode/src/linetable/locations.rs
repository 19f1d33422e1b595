//! Table de localisations 3.11+ (`co_linetable` avec colonnes).
//!
//! ```text
//! 1 kkkk lll      kind k, (l + 1) code units covered
//! k = 15          no location
//! k = 14          long:        svarint line delta, varint end-line delta,
//!                              varint col + 1, varint end col + 1
//! k = 13          no columns:  svarint line delta
//! k = 10..=12     one line:    line delta k - 10, col byte, end col byte
//! k = 0..=9       short:       same line, one byte b2,
//!                              col = k << 3 | b2 >> 4, end col = col + (b2 & 15)
//! ```
//!
//! Varints are little-endian 6-bit groups, bit 6 flagging a continuation.

use pyclens_core::{ByteReader, CoreError, CoreResult};

use super::{Monotonic, PositionDecoder, PositionEntry};

const KIND_NONE: u8 = 15;
const KIND_LONG: u8 = 14;
const KIND_NO_COLUMNS: u8 = 13;
const KIND_ONE_LINE0: u8 = 10;
const KIND_ONE_LINE2: u8 = 12;

/// Champs décodés d'une entrée (sans offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    line: i32,
    end_line: i32,
    col: i32,
    end_col: i32,
}

/// Location table reader (3.11, 3.12).
///
/// Each entry covers a run of code units; `get(offset)` moves past every
/// entry that ends at or before the queried unit and reports the entry
/// covering it. Queries past the end keep returning the last entry.
#[derive(Debug, Clone)]
pub struct LocationTableReader<'a> {
    table: &'a [u8],
    rd: ByteReader<'a>,
    first_line: i32,
    /// Running line, untouched by "no location" entries.
    line: i32,
    /// Code unit range `[start, end)` of the last entry read.
    start: usize,
    end: usize,
    current: Option<Span>,
    monotonic: Monotonic,
}

impl<'a> LocationTableReader<'a> {
    /// Cursor before the first entry.
    pub fn new(table: &'a [u8], first_line: i32) -> Self {
        Self {
            table,
            rd: ByteReader::new(table),
            first_line,
            line: first_line,
            start: 0,
            end: 0,
            current: None,
            monotonic: Monotonic::default(),
        }
    }

    fn read_byte(&mut self) -> CoreResult<u8> {
        self.rd.read_u8()
    }

    fn read_varint(&mut self) -> CoreResult<u32> {
        let mut b = self.read_byte()?;
        let mut val = u32::from(b & 63);
        let mut shift = 0u32;
        while b & 64 != 0 {
            b = self.read_byte()?;
            shift += 6;
            val |= u32::from(b & 63).checked_shl(shift).unwrap_or(0);
        }
        Ok(val)
    }

    fn read_signed_varint(&mut self) -> CoreResult<i32> {
        let u = self.read_varint()?;
        let magnitude = (u >> 1) as i32;
        Ok(if u & 1 != 0 { -magnitude } else { magnitude })
    }

    /// Décode l'entrée suivante et avance `[start, end)`.
    fn read_entry(&mut self) -> CoreResult<Span> {
        let first = self.read_byte()?;
        let kind = (first >> 3) & 15;
        self.start = self.end;
        self.end = self.start + usize::from(first & 7) + 1;

        let span = match kind {
            KIND_NONE => Span { line: -1, end_line: -1, col: -1, end_col: -1 },
            KIND_LONG => {
                self.line = self.line.saturating_add(self.read_signed_varint()?);
                let end_line = self.line.saturating_add(self.read_varint()? as i32);
                let col = (self.read_varint()? as i32).saturating_sub(1);
                let end_col = (self.read_varint()? as i32).saturating_sub(1);
                Span { line: self.line, end_line, col, end_col }
            }
            KIND_NO_COLUMNS => {
                self.line = self.line.saturating_add(self.read_signed_varint()?);
                Span { line: self.line, end_line: self.line, col: -1, end_col: -1 }
            }
            KIND_ONE_LINE0..=KIND_ONE_LINE2 => {
                self.line = self.line.saturating_add(i32::from(kind - KIND_ONE_LINE0));
                let col = i32::from(self.read_byte()?);
                let end_col = i32::from(self.read_byte()?);
                Span { line: self.line, end_line: self.line, col, end_col }
            }
            short => {
                let b2 = self.read_byte()?;
                if b2 & 0x80 != 0 {
                    return Err(CoreError::malformed(
                        "co_linetable",
                        format!("short entry column byte {b2:#04x} has its top bit set"),
                    ));
                }
                let col = i32::from((short << 3) | (b2 >> 4));
                Span { line: self.line, end_line: self.line, col, end_col: col + i32::from(b2 & 15) }
            }
        };
        log::trace!("location [{}, {}) kind {kind}: {span:?}", self.start, self.end);
        Ok(span)
    }

    fn entry(offset: usize, span: Span) -> PositionEntry {
        PositionEntry { offset, line: span.line, end_line: span.end_line, col: span.col, end_col: span.end_col }
    }
}

impl PositionDecoder for LocationTableReader<'_> {
    fn get(&mut self, offset: usize) -> CoreResult<PositionEntry> {
        self.monotonic.check(offset)?;
        while offset / 2 >= self.end && !self.rd.is_empty() {
            self.current = Some(self.read_entry()?);
        }
        Ok(match self.current {
            Some(span) => Self::entry(offset, span),
            None => PositionEntry::line_only(offset, self.line),
        })
    }

    fn read_all(&self) -> CoreResult<Vec<PositionEntry>> {
        let mut fresh = Self::new(self.table, self.first_line);
        let mut out = Vec::new();
        while !fresh.rd.is_empty() {
            let span = fresh.read_entry()?;
            out.push(Self::entry(fresh.start * 2, span));
        }
        Ok(out)
    }
}
