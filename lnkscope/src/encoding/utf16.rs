//! UTF-16LE to UTF-8 transcoding.
//!
//! Shell links store most strings as UTF-16LE. Decoding follows the
//! standard surrogate rules: a high surrogate (D800-DBFF) followed by a low
//! surrogate (DC00-DFFF) combines into a supplementary codepoint; an
//! unpaired surrogate becomes exactly one U+FFFD and does *not* swallow the
//! unit after it; a high surrogate at end of input becomes one U+FFFD.

/// Decode UTF-16LE code units into a UTF-8 string, replacing malformed
/// surrogates with U+FFFD.
#[must_use]
pub fn utf16le_to_utf8(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmp_roundtrip() {
        let units: Vec<u16> = "Hello, Wörld 中文".encode_utf16().collect();
        assert_eq!(utf16le_to_utf8(&units), "Hello, Wörld 中文");
    }

    #[test]
    fn surrogate_pair() {
        // U+1F600 = D83D DE00
        assert_eq!(utf16le_to_utf8(&[0xD83D, 0xDE00]), "\u{1F600}");
    }

    #[test]
    fn unpaired_low_surrogate() {
        assert_eq!(utf16le_to_utf8(&[0xDC00, 0x41]), "\u{FFFD}A");
    }

    #[test]
    fn unpaired_high_keeps_next_unit() {
        // The non-surrogate after the lone high surrogate must survive.
        assert_eq!(utf16le_to_utf8(&[0xD800, 0x41]), "\u{FFFD}A");
    }

    #[test]
    fn high_surrogate_at_end() {
        assert_eq!(utf16le_to_utf8(&[0x41, 0xD800]), "A\u{FFFD}");
    }

    #[test]
    fn two_high_surrogates() {
        // Each unpaired high maps to exactly one replacement.
        assert_eq!(utf16le_to_utf8(&[0xD800, 0xD800]), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn roundtrip_preserves_codepoints() {
        let original = "aé€\u{10FFFF}";
        let units: Vec<u16> = original.encode_utf16().collect();
        let decoded = utf16le_to_utf8(&units);
        assert_eq!(decoded, original);
        assert_eq!(
            decoded.chars().collect::<Vec<_>>(),
            original.chars().collect::<Vec<_>>()
        );
    }
}
