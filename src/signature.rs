//! Signature entity, list validation and the signature catalog
//!
//! A signature is the magic byte sequence that identifies a file format,
//! together with the offset from the start of the file where it must appear.
//! Signature lists are ordered: when several signatures match the same file,
//! the one listed first wins.

use crate::error::{Result, ScanError, SignatureError};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Maximum number of signatures accepted by a single scan.
pub const MAX_SIGNATURES: usize = 1000;

/// An immutable file signature: format name, magic bytes and their offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    name: String,
    pattern: Vec<u8>,
    offset: u64,
}

impl Signature {
    /// Creates a signature whose pattern must appear at `offset`.
    pub fn new(name: impl Into<String>, pattern: impl Into<Vec<u8>>, offset: u64) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            offset,
        }
    }

    /// Creates a signature whose pattern must appear at the very start of the file.
    pub fn at_start(name: impl Into<String>, pattern: impl Into<Vec<u8>>) -> Self {
        Self::new(name, pattern, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of leading bytes a file must have for this signature to fit.
    ///
    /// `None` when `offset + pattern.len()` overflows; such a signature can
    /// never match.
    pub fn required_len(&self) -> Option<u64> {
        self.offset.checked_add(self.pattern.len() as u64)
    }

    /// Checks whether `prefix` (the leading bytes of a file) carries this signature.
    pub fn matches_prefix(&self, prefix: &[u8]) -> bool {
        let Some(required) = self.required_len() else {
            return false;
        };
        if (prefix.len() as u64) < required {
            return false;
        }
        let start = self.offset as usize;
        &prefix[start..start + self.pattern.len()] == self.pattern.as_slice()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{}: {}",
            self.name,
            self.offset,
            hex::encode_upper(&self.pattern)
        )
    }
}

/// Rejects signature lists longer than [`MAX_SIGNATURES`].
///
/// The empty list is valid.
pub fn validate(signatures: &[Signature]) -> Result<()> {
    if signatures.len() > MAX_SIGNATURES {
        return Err(ScanError::TooManySignatures {
            count: signatures.len(),
            max: MAX_SIGNATURES,
        });
    }
    Ok(())
}

/// Built-in signatures for common formats, in match-priority order.
pub fn builtin_signatures() -> Vec<Signature> {
    vec![
        // OLE2 compound document (xls, doc, ppt, msi)
        Signature::at_start("xls", [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]),
        Signature::at_start("jpg", [0xFF, 0xD8, 0xFF]),
        Signature::at_start("png", [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        Signature::at_start("gif", *b"GIF89a"),
        Signature::at_start("gif", *b"GIF87a"),
        Signature::at_start("pdf", *b"%PDF-"),
        Signature::at_start("zip", [0x50, 0x4B, 0x03, 0x04]),
        Signature::at_start("gz", [0x1F, 0x8B]),
        Signature::at_start("bz2", *b"BZh"),
        Signature::at_start("xz", [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]),
        Signature::at_start("7z", [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C]),
        Signature::at_start("elf", [0x7F, 0x45, 0x4C, 0x46]),
        Signature::at_start("sqlite", *b"SQLite format 3\0"),
        Signature::at_start("tiff", [0x49, 0x49, 0x2A, 0x00]),
        Signature::at_start("tiff", [0x4D, 0x4D, 0x00, 0x2A]),
        // RIFF containers carry their form type at offset 8
        Signature::new("webp", *b"WEBP", 8),
        Signature::new("wav", *b"WAVE", 8),
        Signature::new("avi", *b"AVI ", 8),
        Signature::new("mp4", *b"ftyp", 4),
        Signature::new("tar", *b"ustar", 257),
        Signature::new("iso", *b"CD001", 32769),
        // Two bytes only, keep it after everything more specific
        Signature::at_start("bmp", *b"BM"),
    ]
}

#[derive(Debug, Deserialize)]
struct SignatureEntry {
    name: String,
    pattern: String,
    #[serde(default)]
    offset: u64,
}

impl TryFrom<SignatureEntry> for Signature {
    type Error = SignatureError;

    fn try_from(entry: SignatureEntry) -> std::result::Result<Self, Self::Error> {
        let compact: String = entry
            .pattern
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if compact.is_empty() {
            return Err(SignatureError::EmptyPattern { name: entry.name });
        }

        let pattern = hex::decode(&compact).map_err(|source| SignatureError::InvalidHex {
            name: entry.name.clone(),
            source,
        })?;

        Ok(Signature::new(entry.name, pattern, entry.offset))
    }
}

/// Parses a JSON array of `{ "name", "pattern", "offset" }` objects.
///
/// `pattern` is hex (whitespace ignored), `offset` defaults to 0. The list
/// length is not checked here; the scan validates it.
pub fn parse_signatures(json: &str) -> std::result::Result<Vec<Signature>, SignatureError> {
    let entries: Vec<SignatureEntry> = serde_json::from_str(json)?;
    entries.into_iter().map(Signature::try_from).collect()
}

/// Reads and parses a signature file.
pub fn load_signatures(path: &Path) -> std::result::Result<Vec<Signature>, SignatureError> {
    let json = fs::read_to_string(path).map_err(|source| SignatureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_signatures(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_len() {
        let sig = Signature::new("tar", *b"ustar", 257);
        assert_eq!(sig.required_len(), Some(262));
    }

    #[test]
    fn test_required_len_overflow() {
        let sig = Signature::new("huge", [0x00, 0x01], u64::MAX);
        assert_eq!(sig.required_len(), None);
        assert!(!sig.matches_prefix(&[0x00, 0x01]));
    }

    #[test]
    fn test_matches_prefix_with_offset() {
        let sig = Signature::new("xls", [0xCF, 0x11, 0xE0], 1);
        assert!(sig.matches_prefix(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1]));
        assert!(!sig.matches_prefix(&[0xCF, 0x11, 0xE0]));
        assert!(!sig.matches_prefix(&[0xD0, 0xCF, 0x11]));
    }

    #[test]
    fn test_validate_limits() {
        let sig = Signature::at_start("jpg", [0xFF, 0xD8]);
        assert!(validate(&[]).is_ok());
        assert!(validate(&vec![sig.clone(); MAX_SIGNATURES]).is_ok());
        assert_eq!(
            validate(&vec![sig; MAX_SIGNATURES + 1]),
            Err(ScanError::TooManySignatures {
                count: MAX_SIGNATURES + 1,
                max: MAX_SIGNATURES,
            })
        );
    }

    #[test]
    fn test_builtin_signatures_are_valid() {
        let sigs = builtin_signatures();
        assert!(validate(&sigs).is_ok());
        assert_eq!(sigs[0].name(), "xls");
        assert!(sigs.iter().all(|s| !s.pattern().is_empty()));
        assert_eq!(sigs.last().map(Signature::name), Some("bmp"));
    }

    #[test]
    fn test_display() {
        let sig = Signature::at_start("jpg", [0xFF, 0xD8]);
        assert_eq!(sig.to_string(), "jpg @0: FFD8");
    }

    #[test]
    fn test_parse_signatures() {
        let json = r#"[
            { "name": "xls", "pattern": "D0 CF 11 E0 A1 B1 1A E1" },
            { "name": "tar", "pattern": "7573746172", "offset": 257 }
        ]"#;
        let sigs = parse_signatures(json).unwrap();
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].pattern()[0], 0xD0);
        assert_eq!(sigs[0].offset(), 0);
        assert_eq!(sigs[1].pattern(), b"ustar");
        assert_eq!(sigs[1].offset(), 257);
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        let err = parse_signatures(r#"[{ "name": "bad", "pattern": "ZZ" }]"#).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidHex { ref name, .. } if name == "bad"));
    }

    #[test]
    fn test_parse_rejects_empty_pattern() {
        let err = parse_signatures(r#"[{ "name": "none", "pattern": "  " }]"#).unwrap_err();
        assert!(matches!(err, SignatureError::EmptyPattern { .. }));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_signatures("{ not json").unwrap_err();
        assert!(matches!(err, SignatureError::Json(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_signatures(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SignatureError::Io { .. }));
    }
}
