//! Byte-level signature tests against files on disk.

use crate::signature::Signature;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

/// Checks whether the file at `path` carries `signature`.
///
/// Reads exactly `offset + pattern.len()` bytes from the start of the file.
/// Any failure to open, stat or read the file counts as "no match"; the
/// handle is dropped on every return path.
pub fn matches(path: &Path, signature: &Signature) -> bool {
    let Some(required) = signature.required_len() else {
        return false;
    };

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("Unable to open {}: {}", path.display(), e);
            return false;
        }
    };

    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!("Unable to stat {}: {}", path.display(), e);
            return false;
        }
    };

    if required > size {
        trace!(
            "{} is too small for {} ({} < {} bytes)",
            path.display(),
            signature.name(),
            size,
            required
        );
        return false;
    }

    let Ok(required) = usize::try_from(required) else {
        return false;
    };

    let mut prefix = vec![0u8; required];
    if let Err(e) = file.read_exact(&mut prefix) {
        debug!("Unable to read {}: {}", path.display(), e);
        return false;
    }

    signature.matches_prefix(&prefix)
}

/// Returns the first signature in `signatures` that `path` carries.
///
/// List order is match priority: when several signatures fit, the earliest
/// one wins.
pub fn classify<'a>(path: &Path, signatures: &'a [Signature]) -> Option<&'a Signature> {
    signatures.iter().find(|sig| matches(path, sig))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OLE_HEADER: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

    fn temp_with(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_matches_at_start() {
        let file = temp_with(&OLE_HEADER);
        assert!(matches(file.path(), &Signature::at_start("xls", OLE_HEADER)));
    }

    #[test]
    fn test_matches_with_offset() {
        let file = temp_with(&OLE_HEADER);
        let sig = Signature::new("xls", &OLE_HEADER[1..], 1);
        assert!(matches(file.path(), &sig));
    }

    #[test]
    fn test_wrong_offset_does_not_match() {
        let file = temp_with(&OLE_HEADER);
        let sig = Signature::new("xls", OLE_HEADER, 1);
        assert!(!matches(file.path(), &sig));
    }

    #[test]
    fn test_empty_file_is_too_small() {
        let file = temp_with(&[]);
        assert!(!matches(file.path(), &Signature::at_start("xls", OLE_HEADER)));
    }

    #[test]
    fn test_missing_file_does_not_match() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.xls");
        assert!(!matches(&path, &Signature::at_start("xls", OLE_HEADER)));
    }

    #[test]
    fn test_directory_does_not_match() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!matches(dir.path(), &Signature::at_start("xls", OLE_HEADER)));
    }

    #[test]
    fn test_classify_first_match_wins() {
        let file = temp_with(&OLE_HEADER);
        let sigs = vec![
            Signature::at_start("jpg", [0xFF, 0xD8]),
            Signature::at_start("ole", [0xD0, 0xCF]),
            Signature::at_start("xls", OLE_HEADER),
        ];
        assert_eq!(classify(file.path(), &sigs).map(Signature::name), Some("ole"));
    }

    #[test]
    fn test_classify_no_match() {
        let file = temp_with(b"plain text");
        let sigs = vec![Signature::at_start("jpg", [0xFF, 0xD8])];
        assert!(classify(file.path(), &sigs).is_none());
        assert!(classify(file.path(), &[]).is_none());
    }
}
