//! Content hashing for change detection.

use std::fmt::Write;

use sha2::{
    Digest,
    Sha256,
};

/// Hex Sha256 digest over one or more content parts.
///
/// Stable for unchanged input; any changed byte in any part changes the
/// digest.
#[must_use]
pub(crate) fn content_hash(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }

    let mut digest = String::with_capacity(64);
    for byte in hasher.finalize() {
        // Writing to a String cannot fail.
        let _ = write!(digest, "{byte:02x}");
    }
    digest
}
