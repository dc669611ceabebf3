//! Integrity Hashing - SHA-256 fingerprints for issued certificates
//!
//! A certificate's fingerprint is derived from a canonical subset of its
//! record: unique code, participant name, document id and issue date, in
//! that order, concatenated without delimiters.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Length of a generated unique code.
pub const UNIQUE_CODE_LEN: usize = 8;

/// Short uppercase token identifying one issued certificate.
///
/// Printed on the certificate and interpolated into the QR verification URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UniqueCode(String);

impl UniqueCode {
    /// Fresh code: the first eight hex digits of a random UUID, uppercased.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..UNIQUE_CODE_LEN].to_uppercase())
    }

    /// Use a caller-chosen code (imports, reproducible renders, lookups).
    ///
    /// Codes are case-insensitive: surrounding whitespace is dropped and
    /// the rest is uppercased, so `" ab12cd34"` and `"AB12CD34"` are the
    /// same code. Length is not enforced; imported codes may differ.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the integrity hash of a certificate.
///
/// hash = sha256(unique_code + participant_name + document_id + issue_date)
///
/// Returns a lowercase hex digest.
///
/// Fields are joined with no separator, so `("AB", "C")` and `("A", "BC")`
/// in adjacent positions hash identically. Existing digests depend on this
/// layout; a length-prefixed variant would need a new hash version.
pub fn integrity_hash(
    unique_code: &str,
    participant_name: &str,
    document_id: &str,
    issue_date_iso: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(unique_code.as_bytes());
    hasher.update(participant_name.as_bytes());
    hasher.update(document_id.as_bytes());
    hasher.update(issue_date_iso.as_bytes());
    format!("{:x}", hasher.finalize())
}
