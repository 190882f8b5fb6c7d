//! Centralized module for file digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of the given data and returns it as a hex string.
pub fn sha256_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes the MD5 digest of the given data and returns it as a hex string.
pub fn md5_digest(data: &[u8]) -> String {
    hex::encode(md5::compute(data).0)
}

/// Digests recorded for every opened file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigests {
    pub sha256: String,
    pub md5: String,
}

impl FileDigests {
    pub fn compute(data: &[u8]) -> Self {
        Self {
            sha256: sha256_digest(data),
            md5: md5_digest(data),
        }
    }
}
