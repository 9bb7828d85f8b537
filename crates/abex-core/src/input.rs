//! Chat log loading
//!
//! Logs are usually UTF-8, but older Windows clients write Big5 (CP950).

use crate::error::{Error, Result};
use encoding_rs::BIG5;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Decode raw log bytes: UTF-8 first, then Big5
///
/// Returns `None` if the bytes are valid in neither encoding.
pub fn decode_log(bytes: &[u8]) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(_) => BIG5
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned()),
    }
}

/// Split decoded text into trimmed lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim().to_string()).collect()
}

/// Read a chat log and return its trimmed lines
pub fn read_log_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if std::str::from_utf8(&bytes).is_err() {
        warn!(path = %path.display(), "log is not valid UTF-8, trying Big5 (CP950)");
    }

    let text = decode_log(&bytes).ok_or_else(|| Error::Decode {
        path: path.to_path_buf(),
    })?;

    let lines = split_lines(&text);
    debug!(lines = lines.len(), path = %path.display(), "read chat log");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tmp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("abex_input_{}_{}", std::process::id(), name));
        p
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_log("商店 Owner".as_bytes()), Some("商店 Owner".to_string()));
    }

    #[test]
    fn test_decode_big5_fallback() {
        // "商店" in Big5
        let bytes = [0xB0, 0xD3, 0xA9, 0xB1];
        assert_eq!(decode_log(&bytes), Some("商店".to_string()));
    }

    #[test]
    fn test_decode_rejects_invalid_bytes() {
        // 0x80 is a lone byte in both encodings
        assert_eq!(decode_log(&[0x41, 0x80]), None);
    }

    #[test]
    fn test_split_lines_trims() {
        let lines = split_lines("  [CHAT] Owner: A \r\n\t[CHAT] Stock: 1\n");
        assert_eq!(lines, vec!["[CHAT] Owner: A", "[CHAT] Stock: 1"]);
    }

    #[test]
    fn test_read_log_lines() {
        let path = tmp_path("log.txt");
        fs::write(&path, "[CHAT] Owner: A\n[CHAT] Stock: 1\n").unwrap();

        let lines = read_log_lines(&path).unwrap();
        assert_eq!(lines.len(), 2);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_log_lines_missing_file() {
        let err = read_log_lines(tmp_path("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
