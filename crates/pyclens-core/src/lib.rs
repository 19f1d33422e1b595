//! pyclens-core — primitives partagées
//!
//! Fournit :
//! - `Version` + table magic ↔ version (`resolve_version`, `magic_for`, `magic_bytes`)
//! - Tables d'opcodes par génération (`OpcodeTable`, `OpInfo`, `ArgKind`)
//! - Profils de version (`VersionProfile`, `profile_for`)
//! - IO mémoire little-endian : `ByteReader`
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `serde` (par défaut) : derive `Serialize` sur les structures publiques

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

mod error;
mod magic;
pub mod opcodes;
pub mod profile;
mod reader;
mod version;

pub use error::{CoreError, CoreResult};
pub use magic::{magic_bytes, magic_for, resolve_version};
pub use opcodes::{table_for, ArgKind, OpInfo, OpcodeTable, CACHE, EXTENDED_ARG, HAVE_ARGUMENT};
pub use profile::{profile_for, CodeLayout, JumpRule, PositionFormat, VersionProfile};
pub use reader::ByteReader;
pub use version::Version;

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Prélude pratique.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        magic_for, profile_for, resolve_version, ArgKind, ByteReader, CoreError, CoreResult,
        OpInfo, Version, VersionProfile,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
