//! Code objects décodés.

use std::sync::Arc;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::Serialize;

use pyclens_core::Version;

use crate::MarshalValue;

bitflags! {
    /// `co_flags` bits. Unknown bits are retained as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct CodeFlags: u32 {
        /// Locals live in the fast array.
        const OPTIMIZED          = 0x0001;
        /// A fresh locals dict is created per call.
        const NEWLOCALS          = 0x0002;
        /// Takes `*args`.
        const VARARGS            = 0x0004;
        /// Takes `**kwargs`.
        const VARKEYWORDS        = 0x0008;
        /// Nested function.
        const NESTED             = 0x0010;
        /// Generator function.
        const GENERATOR          = 0x0020;
        /// No free or cell variables.
        const NOFREE             = 0x0040;
        /// `async def`.
        const COROUTINE          = 0x0080;
        /// Generator usable in `await`.
        const ITERABLE_COROUTINE = 0x0100;
        /// Async generator.
        const ASYNC_GENERATOR    = 0x0200;
    }
}

/// `localspluskinds` bits (3.11+).
pub mod local_kind {
    /// Argument slot.
    pub const ARG_POS: u8 = 0x02;
    /// Hidden slot (inlined comprehension).
    pub const HIDDEN: u8 = 0x10;
    /// Plain local.
    pub const LOCAL: u8 = 0x20;
    /// Cell variable.
    pub const CELL: u8 = 0x40;
    /// Free variable.
    pub const FREE: u8 = 0x80;
}

/// Variable name tables, whose shape depends on the generation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum LocalsLayout {
    /// Separate tables (3.8 to 3.10).
    Split {
        /// `co_varnames`
        varnames: Vec<Arc<str>>,
        /// `co_cellvars`
        cellvars: Vec<Arc<str>>,
        /// `co_freevars`
        freevars: Vec<Arc<str>>,
    },
    /// One table plus a kind byte per slot (3.11+).
    Unified {
        /// `co_localsplusnames`
        names: Vec<Arc<str>>,
        /// `co_localspluskinds`
        kinds: Arc<[u8]>,
    },
}

impl LocalsLayout {
    fn unified_with<'a>(names: &'a [Arc<str>], kinds: &[u8], bit: u8) -> Vec<&'a str> {
        names
            .iter()
            .zip(kinds)
            .filter(|(_, k)| *k & bit != 0)
            .map(|(n, _)| &**n)
            .collect()
    }

    /// Local variable names.
    pub fn varnames(&self) -> Vec<&str> {
        match self {
            LocalsLayout::Split { varnames, .. } => varnames.iter().map(|n| &**n).collect(),
            LocalsLayout::Unified { names, kinds } => Self::unified_with(names, kinds, local_kind::LOCAL),
        }
    }

    /// Cell variable names.
    pub fn cellvars(&self) -> Vec<&str> {
        match self {
            LocalsLayout::Split { cellvars, .. } => cellvars.iter().map(|n| &**n).collect(),
            LocalsLayout::Unified { names, kinds } => Self::unified_with(names, kinds, local_kind::CELL),
        }
    }

    /// Free variable names.
    pub fn freevars(&self) -> Vec<&str> {
        match self {
            LocalsLayout::Split { freevars, .. } => freevars.iter().map(|n| &**n).collect(),
            LocalsLayout::Unified { names, kinds } => Self::unified_with(names, kinds, local_kind::FREE),
        }
    }

    /// Name targeted by a local-variable argument.
    pub fn local(&self, index: usize) -> Option<&str> {
        let slot = match self {
            LocalsLayout::Split { varnames, .. } => varnames.get(index),
            LocalsLayout::Unified { names, .. } => names.get(index),
        };
        slot.map(|n| &**n)
    }

    /// Name targeted by a cell/free-variable argument.
    ///
    /// Split tables index `cellvars` then `freevars`; unified tables index
    /// the single slot table.
    pub fn free(&self, index: usize) -> Option<&str> {
        match self {
            LocalsLayout::Split { cellvars, freevars, .. } => {
                cellvars.iter().chain(freevars).nth(index).map(|n| &**n)
            }
            LocalsLayout::Unified { names, .. } => names.get(index).map(|n| &**n),
        }
    }
}

/// A decoded code object.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CodeUnit {
    /// Generation the unit was decoded for.
    pub version: Version,
    /// `co_argcount`
    pub argcount: u32,
    /// `co_posonlyargcount`
    pub posonlyargcount: u32,
    /// `co_kwonlyargcount`
    pub kwonlyargcount: u32,
    /// `co_nlocals` (counted from the slot kinds on unified layouts).
    pub nlocals: u32,
    /// `co_stacksize`
    pub stacksize: u32,
    /// `co_flags`
    pub flags: CodeFlags,
    /// Raw wordcode.
    pub code: Arc<[u8]>,
    /// Constant pool, shared with the tuple it was read from.
    pub consts: Arc<[MarshalValue]>,
    /// `co_names`
    pub names: Vec<Arc<str>>,
    /// Variable name tables.
    pub locals: LocalsLayout,
    /// `co_filename`
    pub filename: Arc<str>,
    /// `co_name`
    pub name: Arc<str>,
    /// `co_qualname` (3.11+).
    pub qualname: Option<Arc<str>>,
    /// `co_firstlineno`
    pub first_line: i32,
    /// Raw position table (`co_lnotab` or `co_linetable`).
    pub linetable: Arc<[u8]>,
    /// Raw exception table (empty before 3.11).
    pub exceptiontable: Arc<[u8]>,
}

impl CodeUnit {
    /// Local variable names.
    pub fn varnames(&self) -> Vec<&str> {
        self.locals.varnames()
    }

    /// Cell variable names.
    pub fn cellvars(&self) -> Vec<&str> {
        self.locals.cellvars()
    }

    /// Free variable names.
    pub fn freevars(&self) -> Vec<&str> {
        self.locals.freevars()
    }

    /// Code units stored directly in the constant pool.
    pub fn nested_code(&self) -> impl Iterator<Item = &CodeUnit> {
        self.consts.iter().filter_map(MarshalValue::as_code)
    }

    /// Qualified name, falling back to the plain name.
    pub fn display_name(&self) -> &str {
        self.qualname.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<Arc<str>> {
        v.iter().map(|s| Arc::from(*s)).collect()
    }

    #[test]
    fn split_free_index_spans_cells_then_frees() {
        let layout = LocalsLayout::Split {
            varnames: strings(&["a"]),
            cellvars: strings(&["c0", "c1"]),
            freevars: strings(&["f0"]),
        };
        assert_eq!(layout.free(1), Some("c1"));
        assert_eq!(layout.free(2), Some("f0"));
        assert_eq!(layout.free(3), None);
        assert_eq!(layout.local(0), Some("a"));
    }

    #[test]
    fn unified_tables_are_derived_from_kinds() {
        let layout = LocalsLayout::Unified {
            names: strings(&["x", "cell", "both", "free"]),
            kinds: Arc::from([
                local_kind::LOCAL | local_kind::ARG_POS,
                local_kind::CELL,
                local_kind::LOCAL | local_kind::CELL,
                local_kind::FREE,
            ]),
        };
        assert_eq!(layout.varnames(), ["x", "both"]);
        assert_eq!(layout.cellvars(), ["cell", "both"]);
        assert_eq!(layout.freevars(), ["free"]);
        assert_eq!(layout.free(3), Some("free"));
        assert_eq!(layout.local(1), Some("cell"));
    }

    #[test]
    fn unknown_flag_bits_survive() {
        let flags = CodeFlags::from_bits_retain(0x0100_0003);
        assert!(flags.contains(CodeFlags::OPTIMIZED | CodeFlags::NEWLOCALS));
        assert_eq!(flags.bits(), 0x0100_0003);
    }
}
