//! pyclens-marshal — lecture du format marshal CPython (3.8 → 3.12)
//!
//! Fournit :
//! - `MarshalValue` / `Text` : arbre de valeurs décodé
//! - `CodeUnit`, `CodeFlags`, `LocalsLayout` : code objects typés
//! - `Unmarshaller` + `loads()` : lecteur récursif avec table de références
//! - `PycHeader`, `PycFile`, `load()`, `load_file()` : conteneur `.pyc`
//!
//! Features :
//! - `serde` (par défaut) : derive `Serialize` sur les valeurs et code objects

#![deny(missing_docs)]

mod code;
mod pyc;
mod reader;
mod value;

pub use code::{local_kind, CodeFlags, CodeUnit, LocalsLayout};
pub use pyc::{load, load_file, Invalidation, PycFile, PycHeader, HEADER_LEN};
pub use reader::{loads, Unmarshaller};
pub use value::{MarshalValue, Text};

/// Prélude pratique.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{load, load_file, loads, CodeUnit, MarshalValue, PycFile, Text};
    pub use pyclens_core::prelude::*;
}
