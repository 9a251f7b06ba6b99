//! Content digests
//!
//! A digest only has to tell "same bytes" from "different bytes" between two
//! runs. SHA-256 is used because it is stable across platforms and releases;
//! no security property is relied upon.

use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Length of a hex encoded digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Hash a byte stream until EOF
///
/// Reads the stream in 8KB chunks, so large files are never held in memory.
/// Interrupted reads are retried; any other read error is returned and the
/// partial digest is discarded.
///
/// # Example
///
/// ```rust
/// use foldercheck::hasher::{hash_reader, hash_data};
///
/// let digest = hash_reader(&b"hello"[..]).unwrap();
/// assert_eq!(digest, hash_data(b"hello"));
/// assert_eq!(digest.len(), 64);
/// ```
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash data that is already in memory
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
