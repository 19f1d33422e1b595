//! Tables à paires `(delta octets, delta ligne)` : 3.8/3.9 et 3.10.
//!
//! Both formats share the pair layout. They differ in how the line delta
//! byte is signed, and in *when* the delta is applied: 3.8/3.9 apply it once
//! the byte threshold is crossed, 3.10 applies it as soon as the pair is
//! read. Line numbers produced by the two readers for the same pairs are
//! therefore shifted by one entry.

use pyclens_core::CoreResult;

use super::{Monotonic, PositionDecoder, PositionEntry};

/// État commun aux deux lecteurs.
#[derive(Debug, Clone)]
struct PairCursor<'a> {
    table: &'a [u8],
    /// Length rounded down to whole pairs.
    end: usize,
    pos: usize,
    next_addr: usize,
    line: i32,
    monotonic: Monotonic,
}

impl<'a> PairCursor<'a> {
    fn new(table: &'a [u8], first_line: i32) -> Self {
        let end = table.len() & !1;
        let next_addr = if end > 0 { usize::from(table[0]) } else { 0 };
        Self { table, end, pos: 0, next_addr, line: first_line, monotonic: Monotonic::default() }
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.end
    }

    fn delta_byte(&self) -> u8 {
        self.table[self.pos + 1]
    }
}

/// Replays a table from offset 0, one entry per threshold.
fn replay<R: PositionDecoder>(
    mut reader: R,
    cursor: impl Fn(&R) -> &PairCursor<'_>,
) -> CoreResult<Vec<PositionEntry>> {
    let mut out = Vec::new();
    let mut offset = 0;
    while !cursor(&reader).exhausted() {
        out.push(reader.get(offset)?);
        offset = cursor(&reader).next_addr;
    }
    Ok(out)
}

/* ─────────────────────────── 3.8 / 3.9 ─────────────────────────── */

/// `co_lnotab` reader (3.8, 3.9).
///
/// Line deltas are signed bytes (`>= 0x80` wraps negative).
#[derive(Debug, Clone)]
pub struct LnotabReader<'a> {
    cur: PairCursor<'a>,
    first_line: i32,
}

impl<'a> LnotabReader<'a> {
    /// Cursor at offset 0.
    pub fn new(table: &'a [u8], first_line: i32) -> Self {
        Self { cur: PairCursor::new(table, first_line), first_line }
    }
}

impl PositionDecoder for LnotabReader<'_> {
    fn get(&mut self, offset: usize) -> CoreResult<PositionEntry> {
        self.cur.monotonic.check(offset)?;
        let cur = &mut self.cur;
        while offset >= cur.next_addr && !cur.exhausted() {
            cur.line += i32::from(cur.delta_byte() as i8);
            cur.pos += 2;
            if !cur.exhausted() {
                cur.next_addr += usize::from(cur.table[cur.pos]);
            }
        }
        Ok(PositionEntry::line_only(offset, cur.line))
    }

    fn read_all(&self) -> CoreResult<Vec<PositionEntry>> {
        replay(Self::new(self.cur.table, self.first_line), |r| &r.cur)
    }
}

/* ─────────────────────────── 3.10 ─────────────────────────── */

/// 3.10 `co_linetable` reader.
///
/// A delta of 128 means "no line"; it is read as no change. Deltas above 128
/// are negative.
#[derive(Debug, Clone)]
pub struct Linetable310Reader<'a> {
    cur: PairCursor<'a>,
    first_line: i32,
}

impl<'a> Linetable310Reader<'a> {
    /// Cursor at offset 0, first pair's delta already applied.
    pub fn new(table: &'a [u8], first_line: i32) -> Self {
        let mut cur = PairCursor::new(table, first_line);
        if !cur.exhausted() {
            cur.line += line_delta_310(cur.delta_byte());
        }
        Self { cur, first_line }
    }
}

fn line_delta_310(b: u8) -> i32 {
    match b {
        128 => 0,
        b if b > 128 => i32::from(b) - 256,
        b => i32::from(b),
    }
}

impl PositionDecoder for Linetable310Reader<'_> {
    fn get(&mut self, offset: usize) -> CoreResult<PositionEntry> {
        self.cur.monotonic.check(offset)?;
        let cur = &mut self.cur;
        while offset >= cur.next_addr && !cur.exhausted() {
            cur.pos += 2;
            if !cur.exhausted() {
                cur.next_addr += usize::from(cur.table[cur.pos]);
                cur.line += line_delta_310(cur.delta_byte());
            }
        }
        Ok(PositionEntry::line_only(offset, cur.line))
    }

    fn read_all(&self) -> CoreResult<Vec<PositionEntry>> {
        replay(Self::new(self.cur.table, self.first_line), |r| &r.cur)
    }
}
