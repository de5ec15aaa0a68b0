use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal errors of a scan.
///
/// Per-file and per-entry I/O failures never show up here: they are logged
/// and degrade to "no match" or "entry skipped".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Too many signatures: {count} exceeds the maximum of {max}")]
    TooManySignatures { count: usize, max: usize },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan deadline exceeded")]
    DeadlineExceeded,

    #[error("No scan worker could be started")]
    NoWorkers,
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors raised while loading a signature list from disk.
#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed signature file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signature '{name}' has an invalid hex pattern: {source}")]
    InvalidHex {
        name: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Signature '{name}' has an empty pattern")]
    EmptyPattern { name: String },
}

/// A panic caught while a worker was processing one path.
///
/// The worker that raised it keeps consuming the queue; the fault is
/// collected into the scan report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    pub worker: usize,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker {} faulted on {}: {}",
            self.worker,
            self.path.display(),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_signatures_message() {
        let err = ScanError::TooManySignatures {
            count: 1001,
            max: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Too many signatures: 1001 exceeds the maximum of 1000"
        );
    }

    #[test]
    fn test_worker_fault_display() {
        let fault = WorkerFault {
            worker: 3,
            path: PathBuf::from("/tmp/a.bin"),
            message: "boom".to_string(),
        };
        assert_eq!(fault.to_string(), "worker 3 faulted on /tmp/a.bin: boom");
    }
}
