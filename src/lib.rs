//! Magicscan - file format identification by magic bytes
//!
//! Walks a directory tree, tests every regular file against an ordered list
//! of fixed-offset byte signatures on a pool of worker threads, and reports
//! each match to a callback as soon as it is found.

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod signature;
pub mod walker;

pub use cancel::CancellationToken;
pub use config::ScanOptions;
pub use engine::{ScanReport, Scanner, search};
pub use error::{Result, ScanError, SignatureError, WorkerFault};
pub use matcher::{classify, matches};
pub use signature::{
    MAX_SIGNATURES, Signature, builtin_signatures, load_signatures, parse_signatures, validate,
};
pub use walker::{WalkStats, walk};
