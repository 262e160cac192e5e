//! Common utilities

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a whole file into memory as raw bytes.
///
/// Byte offsets produced by the parser and the search tool index into
/// exactly this buffer, so no newline or encoding translation happens.
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Slice a byte buffer into an owned string, lossily for non-UTF-8 input.
pub fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Write a document to a path, with `-` meaning stdout.
pub fn write_out(out: &Path, doc: &str) -> Result<()> {
    if out.as_os_str() == "-" {
        use std::io::Write;
        std::io::stdout().write_all(doc.as_bytes())?;
    } else {
        fs::write(out, doc).with_context(|| format!("failed to write: {}", out.display()))?;
    }
    Ok(())
}

/// Check if a command is available in PATH
pub fn command_exists(cmd: &str) -> bool {
    std::process::Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
