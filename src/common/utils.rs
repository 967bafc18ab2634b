//! Utility functions for filedepot

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::time::{SystemTime, UNIX_EPOCH};

/// Percent-encoding set for filenames (includes /, %, and control chars)
const FILENAME_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'&');

/// Encode a filename for URL/filesystem usage
pub fn encode_filename(name: &str) -> String {
    utf8_percent_encode(name, FILENAME_ENCODE_SET).to_string()
}

/// Get current Unix timestamp (seconds)
pub fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_escapes_separators() {
        assert_eq!(
            encode_filename("dir/report 2024.txt"),
            "dir%2Freport%202024.txt"
        );
    }

    #[test]
    fn test_plain_name_unchanged() {
        assert_eq!(encode_filename("a.txt"), "a.txt");
    }

    #[test]
    fn test_timestamp_is_unix_seconds() {
        // 2023-11-14, well before any run of this suite
        assert!(timestamp_now() > 1_700_000_000);
    }
}
