//! ANSI / C1 escape removal.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::borrow::Cow;

/// 7-bit `ESC Fe` pairs (CSI excluded), single 8-bit C1 bytes (CSI excluded),
/// and full CSI sequences in either form.
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)\x1B[@-Z\\-_]|[\x80-\x9A\x9C-\x9F]|(?:\x1B\[|\x9B)[0-?]*[ -/]*[@-~]")
        .expect("ANSI escape pattern is valid")
});

/// Remove terminal escape sequences from raw bytes.
///
/// Works on bytes rather than text: the 8-bit forms are not valid UTF-8, and
/// the game freely mixes them into its output.
pub fn strip_ansi(input: &[u8]) -> Cow<'_, [u8]> {
    ANSI_ESCAPE.replace_all(input, &b""[..])
}

/// Strip escapes, decode, and right-trim one line. `None` if the remaining
/// bytes are not UTF-8.
pub fn clean_line(raw: &[u8]) -> Option<String> {
    let stripped = strip_ansi(raw);
    std::str::from_utf8(&stripped)
        .ok()
        .map(|s| s.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_csi_color_codes() {
        let raw = b"\x1b[1;33mSector \x1b[0m: 42";
        assert_eq!(&*strip_ansi(raw), b"Sector : 42");
    }

    #[test]
    fn test_strips_eight_bit_forms() {
        let raw = b"\x9b31mWarps\x85 to";
        assert_eq!(&*strip_ansi(raw), b"Warps to");
    }

    #[test]
    fn test_strips_two_byte_escape() {
        // ESC M, reverse index
        assert_eq!(&*strip_ansi(b"a\x1bMb"), b"ab");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(strip_ansi(b"nothing to do"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_clean_line_rejects_invalid_utf8() {
        assert_eq!(clean_line(b"ok \x1b[0m  "), Some("ok".to_string()));
        assert_eq!(clean_line(b"bad \xff\xfe"), None);
    }
}
