//! File utilities for loading source text.

use std::fs;
use std::io::{Error, ErrorKind};
use std::path::Path;

/// Largest source file accepted by default (16 MiB).
pub const MAX_SOURCE_BYTES: u64 = 16 * 1024 * 1024;

/// Read a UTF-8 text file, rejecting oversized or binary content.
pub fn read_text_file(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    let bytes = fs::read(path)?;

    // Null bytes indicate a binary file
    if bytes.contains(&0) {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("{} looks like a binary file", path.display()),
        ));
    }

    String::from_utf8(bytes).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}
