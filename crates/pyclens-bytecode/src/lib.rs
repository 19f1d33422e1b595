//! pyclens-bytecode — désassemblage du wordcode CPython (3.8 → 3.12)
//!
//! Fournit :
//! - `WordcodeReader` / `RawOpcode` : mots de 2 octets, `EXTENDED_ARG` replié
//! - `Disassembler`, `disassemble()`, `disassemble_tree()` : opcodes résolus
//! - `position_decoder()` : tables de lignes (lnotab, 3.10, localisations 3.11+)
//! - `exception_decoder()` : table d'exceptions 3.11+
//!
//! Features :
//! - `serde` (par défaut) : derive `Serialize` sur opcodes et entrées de tables

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

mod disasm;
mod exception;
pub mod linetable;
mod wordcode;

pub use disasm::{disassemble, disassemble_tree, ArgValue, DisasmOptions, DisassembledCode, Disassembler, Opcode};
pub use exception::{exception_decoder, ExceptionTable, ExceptionTableEntry};
pub use linetable::{
    position_decoder, Linetable310Reader, LnotabReader, LocationTableReader, PositionDecoder, PositionEntry,
    PositionTable,
};
pub use wordcode::{RawOpcode, WordcodeReader};

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Prélude pratique.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        disassemble, disassemble_tree, exception_decoder, position_decoder, ArgValue, Disassembler, Opcode,
        PositionDecoder,
    };
    pub use pyclens_marshal::prelude::*;
}
