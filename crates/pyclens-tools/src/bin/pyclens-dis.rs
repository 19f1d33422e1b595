// crates/pyclens-tools/src/bin/pyclens-dis.rs
//! Désassembleur pour fichiers `.pyc` CPython 3.8 → 3.12.
//!
//! Exemples :
//!   pyclens-dis mod.cpython-311.pyc
//!   pyclens-dis a.pyc b.pyc --tree --lines
//!   cat mod.pyc | pyclens-dis - --json | jq
//!
//! Options utiles :
//!   --tree         : désassemble aussi les fonctions/classes imbriquées
//!   --json         : imprime une vue JSON structurée
//!   --lines        : entrées brutes de la table de positions
//!   --exceptions   : plages de la table d'exceptions (3.11+)
//!   --consts       : constantes et tables de noms
//!   --summary      : une ligne de résumé par fichier
//!   --keep-caches  : garde les mots CACHE (3.11+)
//!   --time         : chrono
//!   -v / -vv       : logs (sinon RUST_LOG)

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use pyclens_bytecode::{exception_decoder, position_decoder, DisasmOptions, Disassembler, PositionDecoder};
use pyclens_marshal::PycFile;
use pyclens_tools::{
    format_elapsed, init_logger, read_input, render_consts, render_exceptions, render_header, render_listing,
    render_positions, render_summary, Report,
};

#[derive(Parser, Debug)]
#[command(name = "pyclens-dis", version, about = "Désassembleur .pyc (CPython 3.8 → 3.12) vers texte/JSON")]
struct Cli {
    /// Fichier(s) .pyc à analyser (ou '-' pour stdin, unique)
    inputs: Vec<String>,

    /// Désassemble récursivement les code objects imbriqués
    #[arg(long)]
    tree: bool,

    /// Affiche un JSON structuré sur stdout
    #[arg(long)]
    json: bool,

    /// Affiche la table de positions brute
    #[arg(long)]
    lines: bool,

    /// Affiche la table d'exceptions
    #[arg(long)]
    exceptions: bool,

    /// Affiche constantes et noms du code de premier niveau
    #[arg(long)]
    consts: bool,

    /// Résumé 1 ligne par fichier (pas de listing)
    #[arg(long, conflicts_with = "json")]
    summary: bool,

    /// Conserve les mots CACHE dans le listing
    #[arg(long)]
    keep_caches: bool,

    /// Affiche la durée de traitement
    #[arg(long)]
    time: bool,

    /// Verbosité des logs (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if cli.inputs.is_empty() {
        return Err(anyhow!("Aucune entrée. Exemple: pyclens-dis mod.pyc --tree"));
    }
    if cli.inputs.len() > 1 && cli.inputs.iter().any(|i| i == "-") {
        return Err(anyhow!("stdin ('-') doit être l'unique entrée"));
    }

    for input in &cli.inputs {
        let (bytes, name) = read_input(input)?;
        process_one(&bytes, &name, &cli)?;
    }
    Ok(())
}

fn process_one(bytes: &[u8], name: &str, cli: &Cli) -> Result<()> {
    let t0 = Instant::now();
    let pyc = PycFile::from_bytes(bytes).with_context(|| format!("Chargement échoué: {name}"))?;
    log::info!("{name}: python {}, {} bytes", pyc.header.version, bytes.len());

    let options = DisasmOptions::new().nested(cli.tree).keep_caches(cli.keep_caches);
    let listing = Disassembler::with_options(&pyc.code, options)?
        .run()
        .with_context(|| format!("Désassemblage échoué: {name}"))?;

    if cli.summary {
        println!("{}", render_summary(name, &pyc, &listing));
        return Ok(());
    }

    let positions = if cli.lines { Some(position_decoder(&pyc.code)?.read_all()?) } else { None };
    let exceptions = if cli.exceptions { Some(exception_decoder(&pyc.code)?.read_all()?) } else { None };

    if cli.json {
        let report = Report { file: name, header: &pyc.header, disassembly: listing, positions, exceptions };
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_header(name, &pyc.header));
        if cli.consts {
            print!("{}", render_consts(&pyc.code));
        }
        println!();
        print!("{}", render_listing(&listing));
        if let Some(entries) = &positions {
            println!();
            print!("{}", render_positions(entries));
        }
        if let Some(entries) = &exceptions {
            println!();
            println!("ExceptionTable:");
            print!("{}", render_exceptions(entries));
        }
    }

    if cli.time {
        eprintln!("⏱️  {}", format_elapsed(t0.elapsed()));
    }
    Ok(())
}
