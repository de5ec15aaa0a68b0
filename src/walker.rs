//! Recursive directory walker feeding candidate paths into the scan queue.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Counters from one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Regular files handed to the queue.
    pub files_published: u64,
    /// Entries skipped because they could not be read.
    pub errors: u64,
    /// The queue had no consumers left, so the walk ended early.
    pub disconnected: bool,
}

/// Walks `root` recursively and sends every regular file to `sink`.
///
/// Directories, symlinks and special files are never sent; links are not
/// followed. Unreadable entries, including a missing root, are logged and
/// skipped. `token` is checked before traversal and again at every entry.
/// Sending blocks while the queue is full.
pub fn walk(root: &Path, sink: &Sender<PathBuf>, token: &CancellationToken) -> Result<WalkStats> {
    token.check()?;

    let mut stats = WalkStats::default();

    for entry in WalkDir::new(root).follow_links(false) {
        token.check()?;

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Unable to read directory entry: {}", e);
                stats.errors += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if sink.send(entry.into_path()).is_err() {
            debug!("Scan queue closed, stopping walk of {}", root.display());
            stats.disconnected = true;
            break;
        }
        stats.files_published += 1;
    }

    Ok(stats)
}
