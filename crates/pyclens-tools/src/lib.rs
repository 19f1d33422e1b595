//! pyclens-tools — Bibliothèque commune pour les outils CLI pyclens.
//!
//! Objectifs : mutualiser I/O, logs, rendu texte et JSON du désassemblage.
//!
//! ## Modules & zones clés
//! - `prelude` : import rapide des types/fns usuels
//! - Logs      : `init_logger` (env_logger, `RUST_LOG`)
//! - I/O       : `read_bytes`, `read_input` (`-` = stdin)
//! - Rendu     : `render_header`, `render_listing`, `render_consts`,
//!               `render_positions`, `render_exceptions`, `render_summary`
//! - JSON      : `Report` (serde)
//!
//! Les fonctions renvoient `anyhow::Result` quand elles touchent au disque.

#![deny(missing_docs)]

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use pyclens_bytecode::{DisassembledCode, ExceptionTableEntry, PositionEntry};
use pyclens_marshal::{CodeUnit, Invalidation, PycFile, PycHeader};

/// Version lisible du crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Petite bannière de version utile pour logs/outils.
pub fn version_banner(tool: &str) -> String {
    format!("{tool} (pyclens {VERSION})")
}

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Prelude pratique pour les bins : re-exports compacts.
pub mod prelude {
    pub use anyhow::{anyhow, Context, Result};
    pub use pyclens_bytecode::prelude::*;

    pub use crate::{
        format_elapsed, init_logger, read_bytes, read_input, render_consts, render_exceptions, render_header,
        render_listing, render_positions, render_summary, version_banner, Report,
    };
}

/* ─────────────────────────── Logs ─────────────────────────── */

/// Initialise `env_logger` une seule fois.
///
/// `RUST_LOG` wins when set; otherwise the filter is `warn`, raised to
/// `info`, `debug` then `trace` by each `-v`.
pub fn init_logger(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

/* ─────────────────────────── I/O ─────────────────────────── */

/// Lit un fichier binaire complet.
pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).with_context(|| format!("Lecture échouée: {}", path.display()))
}

/// Lit `arg` (fichier, ou stdin si `-`) et renvoie `(octets, nom affichable)`.
pub fn read_input(arg: &str) -> Result<(Vec<u8>, String)> {
    if arg == "-" {
        let mut v = Vec::new();
        io::stdin().read_to_end(&mut v).context("Lecture stdin échouée")?;
        Ok((v, "<stdin>".to_owned()))
    } else {
        Ok((read_bytes(arg)?, arg.to_owned()))
    }
}

/// Durée de décodage : µs sous la milliseconde, sinon ms avec deux décimales.
pub fn format_elapsed(d: Duration) -> String {
    if d < Duration::from_millis(1) {
        format!("{} µs", d.as_micros())
    } else {
        format!("{:.2} ms", d.as_secs_f64() * 1000.0)
    }
}

/* ─────────────────────────── Rendu texte ─────────────────────────── */

/// En-tête pyc sur quelques lignes.
pub fn render_header(name: &str, header: &PycHeader) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let _ = writeln!(out, "python {} (magic {}), flags {:#x}", header.version, header.magic, header.flags);
    match header.invalidation {
        Invalidation::Timestamp { mtime, source_size } => {
            let _ = writeln!(out, "timestamp-based: mtime={mtime}, source size={source_size}");
        }
        Invalidation::Hash { check_source, hash } => {
            let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
            let _ = writeln!(out, "hash-based: {hex} (check_source={check_source})");
        }
    }
    out
}

/// Listing complet, enfants compris.
pub fn render_listing(code: &DisassembledCode<'_>) -> String {
    let mut out = String::new();
    write_listing(&mut out, code);
    out
}

fn write_listing(out: &mut String, code: &DisassembledCode<'_>) {
    let _ = writeln!(out, "Disassembly of <code:{}> (line {}):", code.name, code.first_line);
    for op in &code.opcodes {
        let _ = writeln!(out, "{op}");
    }
    for child in &code.children {
        let _ = writeln!(out);
        write_listing(out, child);
    }
}

/// Table des constantes et des noms d'un code unit.
pub fn render_consts(code: &CodeUnit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "consts ({}):", code.consts.len());
    for (i, value) in code.consts.iter().enumerate() {
        let _ = writeln!(out, "  [{i:>3}] {value}");
    }
    let tables = [
        ("names", code.names.iter().map(|n| &**n).collect::<Vec<_>>()),
        ("varnames", code.varnames()),
        ("cellvars", code.cellvars()),
        ("freevars", code.freevars()),
    ];
    for (label, names) in tables {
        if !names.is_empty() {
            let _ = writeln!(out, "{label}: {}", names.join(", "));
        }
    }
    out
}

/// Entrées brutes de la table de positions.
pub fn render_positions(entries: &[PositionEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6} {:>6} {:>6} {:>5} {:>5}", "offset", "line", "end", "col", "end");
    for e in entries {
        let _ = writeln!(out, "{:>6} {:>6} {:>6} {:>5} {:>5}", e.offset, e.line, e.end_line, e.col, e.end_col);
    }
    out
}

/// Plages protégées de la table d'exceptions.
pub fn render_exceptions(entries: &[ExceptionTableEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        out.push_str("no exception table\n");
        return out;
    }
    for e in entries {
        let _ = writeln!(
            out,
            "  {} to {} -> {} [{}]{}",
            e.start,
            e.end,
            e.target,
            e.depth,
            if e.lasti { " lasti" } else { "" }
        );
    }
    out
}

/// Résumé compact : version, unités, opcodes.
pub fn render_summary(name: &str, pyc: &PycFile, listing: &DisassembledCode<'_>) -> String {
    format!(
        "{name}: python {}, {} code unit(s), {} opcodes, {} top-level consts",
        pyc.header.version,
        count_units(&pyc.code),
        listing.total_opcodes(),
        pyc.code.consts.len()
    )
}

fn count_units(code: &CodeUnit) -> usize {
    1 + code.nested_code().map(count_units).sum::<usize>()
}

/* ─────────────────────────── JSON ─────────────────────────── */

/// Document JSON produit par `pyclens-dis --json`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Nom de l'entrée.
    pub file: &'a str,
    /// En-tête pyc.
    pub header: &'a PycHeader,
    /// Désassemblage (imbriqué ou non).
    pub disassembly: DisassembledCode<'a>,
    /// Table de positions du code de premier niveau.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<PositionEntry>>,
    /// Table d'exceptions du code de premier niveau.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<ExceptionTableEntry>>,
}

impl Report<'_> {
    /// Sérialise en JSON indenté.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Sérialisation JSON échouée")
    }
}
