use clap::{Parser, Subcommand};
use magicscan::{Signature, SignatureError, builtin_signatures, load_signatures};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "magicscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Identify files by their magic bytes", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory tree and print every identified file
    Scan {
        /// Directory (or single file) to scan
        root: PathBuf,

        /// JSON signature file; the built-in catalog is used when absent
        #[arg(short, long)]
        signatures: Option<PathBuf>,

        /// Number of matcher workers (defaults to the CPU count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Stop after this many matches
        #[arg(long)]
        limit: Option<u64>,

        /// Print one JSON object per match instead of tab-separated text
        #[arg(long)]
        json: bool,
    },

    /// Print the active signature list
    ListSignatures {
        /// JSON signature file; the built-in catalog is used when absent
        #[arg(short, long)]
        signatures: Option<PathBuf>,
    },
}

pub fn resolve_signatures(path: Option<&Path>) -> Result<Vec<Signature>, SignatureError> {
    match path {
        Some(path) => load_signatures(path),
        None => Ok(builtin_signatures()),
    }
}

#[derive(Debug, Serialize)]
pub struct MatchRecord<'a> {
    pub path: &'a Path,
    #[serde(rename = "type")]
    pub file_type: &'a str,
}

pub fn format_match(path: &Path, file_type: &str, json: bool) -> String {
    if json {
        let record = MatchRecord { path, file_type };
        serde_json::to_string(&record)
            .unwrap_or_else(|_| format!("{}\t{}", path.display(), file_type))
    } else {
        format!("{}\t{}", path.display(), file_type)
    }
}

pub fn format_signature(signature: &Signature) -> String {
    format!(
        "{:<8} {:>6}  {}",
        signature.name(),
        signature.offset(),
        hex::encode_upper(signature.pattern())
    )
}
