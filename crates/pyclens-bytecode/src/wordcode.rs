//! Lecture brute du wordcode : mots de 2 octets, `EXTENDED_ARG` replié.

#[cfg(feature = "serde")]
use serde::Serialize;

use pyclens_core::{EXTENDED_ARG, HAVE_ARGUMENT};

/// One instruction with its prefixes folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RawOpcode {
    /// Offset of the first word (the first `EXTENDED_ARG` prefix, if any).
    pub start: usize,
    /// Offset just past the instruction word.
    pub end: usize,
    /// Numeric opcode.
    pub op: u8,
    /// Folded argument, for opcodes at or above `HAVE_ARGUMENT`.
    pub arg: Option<u32>,
}

/// Iterator over the instructions of a wordcode buffer.
///
/// `EXTENDED_ARG` words are folded into the following instruction and never
/// yielded. A trailing odd byte is ignored.
#[derive(Debug, Clone)]
pub struct WordcodeReader<'a> {
    code: &'a [u8],
    pos: usize,
    ext: u32,
    prefix_start: Option<usize>,
}

impl<'a> WordcodeReader<'a> {
    /// Reader positioned at offset 0.
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, pos: 0, ext: 0, prefix_start: None }
    }
}

impl Iterator for WordcodeReader<'_> {
    type Item = RawOpcode;

    fn next(&mut self) -> Option<RawOpcode> {
        loop {
            let word = self.code.get(self.pos..self.pos + 2)?;
            let (op, arg) = (word[0], word[1]);
            let start = *self.prefix_start.get_or_insert(self.pos);
            self.pos += 2;
            let folded = u32::from(arg) | self.ext;
            if op == EXTENDED_ARG {
                self.ext = folded << 8;
                continue;
            }
            self.ext = 0;
            self.prefix_start = None;
            let arg = (op >= HAVE_ARGUMENT).then_some(folded);
            return Some(RawOpcode { start, end: self.pos, op, arg });
        }
    }
}
