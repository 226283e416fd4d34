//! Artifact file naming and replacement.
//!
//! Filenames follow `<number>_<sanitizedCounterparty>_<DD-MM-YYYY>.pdf`.
//! Replacement is two-phase at the call site (`workspace`): the new file is
//! written first, the record is repointed, and only then is the superseded
//! file removed, so the record never references a file that does not exist.

use crate::error::Result;
use crate::store::atomic;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Longest sanitized counterparty segment, in characters.
const MAX_NAME_CHARS: usize = 40;

/// Keep alphanumerics (any script) and spaces, drop everything else, then
/// turn spaces into underscores and truncate.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_NAME_CHARS)
        .collect()
}

/// `PO00007_Acme_Metals_12-03-2026.pdf`; a missing or fully stripped
/// counterparty falls back to `document`.
pub fn artifact_filename(
    number: &str,
    counterparty: Option<&str>,
    date: DateTime<Utc>,
) -> String {
    let middle = counterparty
        .map(sanitize_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{}_{}_{}.pdf", number, middle, date.format("%d-%m-%Y"))
}

/// Durably write a new artifact file; the caller repoints the record before
/// removing any predecessor.
pub fn write_artifact(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(filename);
    atomic::write_atomic(&path, bytes)?;
    Ok(path)
}

/// Remove a superseded artifact. Failure here is a degraded condition, not
/// an error: the new artifact is already durable and the record already
/// points at it.
pub fn remove_artifact(dir: &Path, filename: &str) {
    let path = dir.join(filename);
    if let Err(e) = fs::remove_file(&path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove superseded artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_keeps_alphanumerics_and_spaces() {
        assert_eq!(sanitize_name("Acme Metals Ltd."), "Acme_Metals_Ltd");
        assert_eq!(sanitize_name("Al-Noor ★ Trading"), "AlNoor_Trading");
        assert_eq!(sanitize_name("شركة النور"), "شركة_النور");
        assert_eq!(sanitize_name("!!!"), "");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_name(&long).chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_artifact_filename_convention() {
        let date = Utc.with_ymd_and_hms(2026, 3, 12, 10, 0, 0).unwrap();
        assert_eq!(
            artifact_filename("PO00007", Some("Acme Metals"), date),
            "PO00007_Acme_Metals_12-03-2026.pdf"
        );
        assert_eq!(
            artifact_filename("IMR0001", None, date),
            "IMR0001_document_12-03-2026.pdf"
        );
    }
}
