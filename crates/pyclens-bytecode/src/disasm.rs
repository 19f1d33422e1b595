//! Désassemblage d'un `CodeUnit` : mnémoniques, arguments résolus, positions.
//!
//! The version profile attached to the unit decides every generation-specific
//! rule (opcode table, jump arithmetic, name-index shifts, cache slots);
//! nothing here compares version numbers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use pyclens_core::{profile_for, ArgKind, CoreError, CoreResult, JumpRule, OpInfo, VersionProfile};
use pyclens_marshal::{CodeUnit, MarshalValue};

use crate::linetable::{position_decoder, PositionDecoder};
use crate::wordcode::{RawOpcode, WordcodeReader};

/* ─────────────────────────── Options ─────────────────────────── */

/// Disassembly switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisasmOptions {
    /// Recurse into code constants (see [`DisassembledCode::children`]).
    pub nested: bool,
    /// Emit inline `CACHE` words instead of dropping them.
    pub keep_caches: bool,
}

impl DisasmOptions {
    /// Flat listing, caches dropped.
    pub const fn new() -> Self {
        Self { nested: false, keep_caches: false }
    }

    /// Active/désactive la récursion.
    #[must_use]
    pub const fn nested(mut self, yes: bool) -> Self {
        self.nested = yes;
        self
    }

    /// Garde/supprime les `CACHE`.
    #[must_use]
    pub const fn keep_caches(mut self, yes: bool) -> Self {
        self.keep_caches = yes;
        self
    }
}

/* ─────────────────────────── Sorties ─────────────────────────── */

/// Resolved meaning of an instruction argument.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ArgValue<'a> {
    /// Constant pool entry.
    Const(&'a MarshalValue),
    /// Global / attribute name.
    Name(&'a str),
    /// Local variable.
    Local(&'a str),
    /// Cell or free variable.
    Free(&'a str),
    /// Jump target, as a byte offset.
    Jump(usize),
    /// Argument with no table behind it.
    Raw(u32),
    /// The index points outside its table.
    Unresolvable,
}

impl fmt::Display for ArgValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Const(v) => write!(f, "({v})"),
            ArgValue::Name(n) | ArgValue::Local(n) | ArgValue::Free(n) => write!(f, "({n})"),
            ArgValue::Jump(target) => write!(f, "(to {target})"),
            ArgValue::Raw(_) => Ok(()),
            ArgValue::Unresolvable => f.write_str("(<unknown>)"),
        }
    }
}

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Opcode<'a> {
    /// Byte offset (first `EXTENDED_ARG` prefix included).
    pub offset: usize,
    /// Offset just past the instruction.
    pub end: usize,
    /// Source line, `-1` when unknown.
    pub line: i32,
    /// Last source line, `-1` when unknown.
    pub end_line: i32,
    /// Start column, `-1` when unknown.
    pub col: i32,
    /// End column, `-1` when unknown.
    pub end_col: i32,
    /// Numeric opcode.
    pub op: u8,
    /// Mnemonic.
    pub name: &'static str,
    /// Raw (folded) argument.
    pub arg: Option<u32>,
    /// Resolved argument.
    pub argval: Option<ArgValue<'a>>,
}

impl<'a> Opcode<'a> {
    /// Code unit carried by a `LOAD_CONST`-like argument.
    pub fn code_const(&self) -> Option<&'a CodeUnit> {
        match self.argval {
            Some(ArgValue::Const(value)) => value.as_code(),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}{:>6}  ", self.line, self.offset)?;
        let Some(arg) = self.arg else {
            return f.write_str(self.name);
        };
        write!(f, "{:<30}{arg:>5}", self.name)?;
        match self.argval {
            None | Some(ArgValue::Raw(_)) => Ok(()),
            Some(val) => write!(f, " {val}"),
        }
    }
}

/// Disassembly of a code unit and, recursively, of the code units it loads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DisassembledCode<'a> {
    /// Qualified (or plain) name of the unit.
    pub name: &'a str,
    /// First source line.
    pub first_line: i32,
    /// Instructions.
    pub opcodes: Vec<Opcode<'a>>,
    /// Nested units, in the order their constants are first loaded.
    pub children: Vec<DisassembledCode<'a>>,
}

impl DisassembledCode<'_> {
    /// Nombre total d'instructions (enfants compris).
    pub fn total_opcodes(&self) -> usize {
        self.opcodes.len() + self.children.iter().map(DisassembledCode::total_opcodes).sum::<usize>()
    }
}

/* ─────────────────────────── Désassembleur ─────────────────────────── */

/// Disassembler bound to one code unit.
#[derive(Debug, Clone, Copy)]
pub struct Disassembler<'c> {
    code: &'c CodeUnit,
    profile: &'static VersionProfile,
    options: DisasmOptions,
}

impl<'c> Disassembler<'c> {
    /// Disassembler with default options.
    pub fn new(code: &'c CodeUnit) -> CoreResult<Self> {
        Self::with_options(code, DisasmOptions::default())
    }

    /// Disassembler with explicit options.
    pub fn with_options(code: &'c CodeUnit, options: DisasmOptions) -> CoreResult<Self> {
        Ok(Self { code, profile: profile_for(code.version)?, options })
    }

    /// Profil utilisé.
    pub const fn profile(&self) -> &'static VersionProfile {
        self.profile
    }

    /// Flat instruction listing of this unit only.
    pub fn opcodes(&self) -> CoreResult<Vec<Opcode<'c>>> {
        let mut positions = position_decoder(self.code)?;
        let mut out = Vec::new();
        for raw in WordcodeReader::new(&self.code.code) {
            if self.profile.is_cache(raw.op) && !self.options.keep_caches {
                continue;
            }
            let info = self.lookup(&raw)?;
            let pos = positions.get(raw.start)?;
            out.push(Opcode {
                offset: raw.start,
                end: raw.end,
                line: pos.line,
                end_line: pos.end_line,
                col: pos.col,
                end_col: pos.end_col,
                op: raw.op,
                name: info.name,
                arg: raw.arg,
                argval: self.resolve(info, &raw),
            });
        }
        log::debug!(
            "disassembled {} (python {}): {} opcodes",
            self.code.display_name(),
            self.profile.version,
            out.len()
        );
        Ok(out)
    }

    /// Listing of this unit, plus nested units when [`DisasmOptions::nested`] is set.
    pub fn run(&self) -> CoreResult<DisassembledCode<'c>> {
        let opcodes = self.opcodes()?;
        let mut children = Vec::new();
        if self.options.nested {
            let mut seen: Vec<&CodeUnit> = Vec::new();
            for child in opcodes.iter().filter_map(Opcode::code_const) {
                if seen.iter().any(|s| std::ptr::eq(*s, child)) {
                    continue;
                }
                seen.push(child);
                children.push(Self::with_options(child, self.options)?.run()?);
            }
        }
        Ok(DisassembledCode {
            name: self.code.display_name(),
            first_line: self.code.first_line,
            opcodes,
            children,
        })
    }

    fn lookup(&self, raw: &RawOpcode) -> CoreResult<&'static OpInfo> {
        self.profile.opcodes.get(raw.op).ok_or_else(|| CoreError::UnknownOpcode {
            opcode: raw.op,
            version: self.profile.version,
            offset: raw.start,
        })
    }

    fn resolve(&self, info: &OpInfo, raw: &RawOpcode) -> Option<ArgValue<'c>> {
        let arg = raw.arg?;
        let index = (arg >> self.profile.name_shift(info.name)) as usize;
        let code = self.code;
        Some(match info.kind {
            ArgKind::Const => code.consts.get(index).map_or(ArgValue::Unresolvable, ArgValue::Const),
            ArgKind::Name => {
                code.names.get(index).map_or(ArgValue::Unresolvable, |n| ArgValue::Name(&**n))
            }
            ArgKind::Local => code.locals.local(index).map_or(ArgValue::Unresolvable, ArgValue::Local),
            ArgKind::Free => code.locals.free(index).map_or(ArgValue::Unresolvable, ArgValue::Free),
            ArgKind::JumpRel => self.relative_target(info, arg, raw.end),
            ArgKind::JumpAbs => match self.profile.jump_rule {
                JumpRule::ByteRelative => ArgValue::Jump(arg as usize),
                JumpRule::WordRelative | JumpRule::WordAbsoluteOnly => ArgValue::Jump(arg as usize * 2),
            },
            ArgKind::Plain => ArgValue::Raw(arg),
        })
    }

    fn relative_target(&self, info: &OpInfo, arg: u32, end: usize) -> ArgValue<'c> {
        let arg = arg as usize;
        match self.profile.jump_rule {
            JumpRule::ByteRelative => ArgValue::Jump(end + arg),
            JumpRule::WordRelative if info.is_backward_jump() => ArgValue::Jump(end.saturating_sub(arg * 2)),
            JumpRule::WordRelative => ArgValue::Jump(end + arg * 2),
            JumpRule::WordAbsoluteOnly => ArgValue::Raw(arg as u32),
        }
    }
}

/// Flat listing of `code`.
pub fn disassemble(code: &CodeUnit) -> CoreResult<Vec<Opcode<'_>>> {
    Disassembler::new(code)?.opcodes()
}

/// Listing of `code` with every nested code unit.
pub fn disassemble_tree(code: &CodeUnit) -> CoreResult<DisassembledCode<'_>> {
    Disassembler::with_options(code, DisasmOptions::new().nested(true))?.run()
}
