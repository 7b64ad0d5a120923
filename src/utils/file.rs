//! File helpers for the document source.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// SHA-256 of the content, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Read a UTF-8 file, refusing anything larger than `max_size` bytes.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    fs::read_to_string(path)
}

/// Path of `path` below `base`, with `/` separators on every platform.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether the file extension equals `extension`, ignoring ASCII case.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}
