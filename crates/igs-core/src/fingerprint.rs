//! # Declaration Fingerprints
//!
//! A [`Fingerprint`] is the SHA-256 digest of a declaration's canonical
//! bytes. The registry stores one per declared local name and compares
//! fingerprints to decide whether a redeclaration in another module is the
//! same logical type or a conflict.
//!
//! `fingerprint()` accepts only `&CanonicalBytes`, so every digest in the
//! engine flows through the same canonicalization pipeline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// SHA-256 digest of a canonicalized declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First eight hex characters, enough to tell declarations apart in logs.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(8);
        hex
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the fingerprint of canonical bytes.
pub fn fingerprint(data: &CanonicalBytes) -> Fingerprint {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    Fingerprint(bytes)
}
