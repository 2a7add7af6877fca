//! Content hashing for change detection
//!
//! Hashes the first 1 MiB of a file so re-scans can skip unchanged tracks
//! without reading whole multi-megabyte audio files. MD5 is fine here: this
//! is a change-detection fingerprint, not a security boundary.

use crate::error::{DeepcrateError, Result};
use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

/// Number of leading bytes hashed for the content fingerprint
const HASH_PREFIX_BYTES: usize = 1_048_576;

/// Hash raw content bytes (up to the first 1 MiB) to a hex digest
pub fn content_hash(bytes: &[u8]) -> String {
    let prefix = &bytes[..bytes.len().min(HASH_PREFIX_BYTES)];
    let mut hasher = Md5::new();
    hasher.update(prefix);
    hex::encode(hasher.finalize())
}

/// Hash a file's leading content to a hex digest
///
/// This is the one place the core touches the filesystem; an unreadable file
/// is reported as a per-file failure for the caller to skip or retry.
pub fn file_hash(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| DeepcrateError::read_error(path, e))?;

    let mut buffer = vec![0u8; HASH_PREFIX_BYTES];
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file
            .read(&mut buffer[filled..])
            .map_err(|e| DeepcrateError::read_error(path, e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(content_hash(&buffer[..filled]))
}
