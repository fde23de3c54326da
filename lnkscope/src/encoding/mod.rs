//! Legacy codepage decoding and UTF-16 transcoding.
//!
//! Strings written by pre-Unicode Windows are raw bytes in whichever
//! codepage the writing machine used; the file does not say which. The
//! parser therefore carries such strings as bytes and the renderers decode
//! them with a caller-selected [`Codec`]. Fifteen codepages are supported:
//! 874 (Thai), the double-byte CJK pages 932/936/949/950/1361, and the
//! windows-125x family.
//!
//! Decoding is table-driven: each codepage has a 256-entry single-byte map
//! (zero marks an undefined mapping) and, for the CJK pages, per-lead-byte
//! trail windows. Undefined mappings, truncated double-byte sequences and
//! codepoints in the surrogate range all decode to U+FFFD.

mod tables;
mod utf16;

pub use utf16::utf16le_to_utf8;

use std::sync::{Arc, OnceLock};

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Double-byte window for one lead byte: trail bytes in
/// `[trail_start, trail_start + table.len())` index into `table`.
pub(crate) struct DoubleByteDef {
    pub lead: u8,
    pub trail_start: u8,
    pub table: &'static [u16],
}

/// One codepage: human label, single-byte map, double-byte windows.
pub(crate) struct CodepageDef {
    pub label: &'static str,
    pub single: &'static [u16; 256],
    pub double: &'static [DoubleByteDef],
}

/// A decoder for one legacy codepage.
///
/// Construction resolves the per-lead-byte dispatch table once; instances
/// are value objects over static data and are shared through
/// [`CodecFactory`] as reference-counted handles.
pub struct Codec {
    index: usize,
    single: &'static [u16; 256],
    double: [Option<&'static DoubleByteDef>; 256],
}

impl Codec {
    /// Number of codepages in the catalogue.
    pub const COUNT: usize = 15;

    /// Build the decoder for catalogue entry `index`.
    ///
    /// Returns `None` when `index` is outside the catalogue.
    #[must_use]
    pub fn new(index: usize) -> Option<Codec> {
        let def = tables::CODEPAGES.get(index)?;
        let mut double = [None; 256];
        for entry in def.double {
            double[entry.lead as usize] = Some(entry);
        }
        Some(Codec {
            index,
            single: def.single,
            double,
        })
    }

    /// Catalogue index of this codec.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human label, e.g. `"1252 - Latin 1"`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        tables::CODEPAGES[self.index].label
    }

    /// All catalogue labels, in catalogue order.
    #[must_use]
    pub fn labels() -> Vec<&'static str> {
        tables::CODEPAGES.iter().map(|def| def.label).collect()
    }

    /// Decode one character at `pos`; returns the codepoint (surrogate and
    /// out-of-range values not yet replaced) and the bytes consumed (1 or 2).
    fn decode_char(&self, bytes: &[u8], pos: usize) -> (u32, usize) {
        let c1 = bytes[pos];
        let Some(def) = self.double[c1 as usize] else {
            let mapped = self.single[c1 as usize];
            if mapped == 0 {
                return (u32::from(REPLACEMENT), 1);
            }
            return (u32::from(mapped), 1);
        };

        // c1 is a lead byte; a trail byte must follow
        let Some(&c2) = bytes.get(pos + 1) else {
            return (u32::from(REPLACEMENT), 1);
        };
        let window_end = usize::from(def.trail_start) + def.table.len();
        if c2 >= def.trail_start && usize::from(c2) < window_end {
            let mapped = def.table[usize::from(c2 - def.trail_start)];
            if mapped == 0 {
                return (u32::from(REPLACEMENT), 2);
            }
            return (u32::from(mapped), 2);
        }
        (u32::from(REPLACEMENT), 2)
    }

    /// Decode a legacy byte string to UTF-8.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut pos = 0;
        while pos < bytes.len() {
            let (codepoint, consumed) = self.decode_char(bytes, pos);
            let c = match char::from_u32(codepoint) {
                // char::from_u32 already rejects surrogates and > 0x10FFFF
                Some(c) => c,
                None => REPLACEMENT,
            };
            out.push(c);
            pos += consumed;
        }
        out
    }
}

/// Hands out shared [`Codec`] instances, one per catalogue entry.
///
/// The table data is static; the factory only caches the built lead-byte
/// dispatch arrays so concurrent parses share them.
#[derive(Default)]
pub struct CodecFactory;

#[allow(clippy::declare_interior_mutable_const)]
const SHARED_INIT: OnceLock<Arc<Codec>> = OnceLock::new();
static SHARED: [OnceLock<Arc<Codec>>; Codec::COUNT] = [SHARED_INIT; Codec::COUNT];

impl CodecFactory {
    /// Shared codec for catalogue entry `index`.
    #[must_use]
    pub fn get(index: usize) -> Option<Arc<Codec>> {
        let slot = SHARED.get(index)?;
        Some(Arc::clone(slot.get_or_init(|| {
            // index was just bounds-checked against the catalogue
            Arc::new(Codec::new(index).unwrap_or_else(|| unreachable!()))
        })))
    }

    /// Resolve a codec by case-sensitive label prefix.
    ///
    /// The prefix must match exactly one catalogue label; an empty or
    /// ambiguous prefix selects nothing.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Arc<Codec>> {
        if name.is_empty() {
            return None;
        }
        let mut found = None;
        for (index, def) in tables::CODEPAGES.iter().enumerate() {
            if def.label.starts_with(name) {
                if found.is_some() {
                    return None; // not unique
                }
                found = Some(index);
            }
        }
        Self::get(found?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(prefix: &str) -> Arc<Codec> {
        CodecFactory::by_name(prefix).unwrap()
    }

    #[test]
    fn catalogue_has_fifteen_entries() {
        assert_eq!(tables::CODEPAGES.len(), Codec::COUNT);
        assert_eq!(Codec::labels().len(), 15);
    }

    #[test]
    fn ascii_passthrough() {
        let latin = codec("1252");
        assert_eq!(latin.decode(b"Program Files"), "Program Files");
    }

    #[test]
    fn single_byte_high_range() {
        let latin = codec("1252");
        // 0x80 is the euro sign in windows-1252
        assert_eq!(latin.decode(&[0x80]), "\u{20AC}");
        assert_eq!(latin.decode(&[0xE9]), "é");
    }

    #[test]
    fn undefined_single_byte_replaces() {
        // 0x81 has no mapping in windows-1252
        let latin = codec("1252");
        assert_eq!(latin.decode(&[0x81]), "\u{FFFD}");
    }

    #[test]
    fn cyrillic() {
        let cyr = codec("1251");
        assert_eq!(cyr.decode(&[0xCF, 0xF0, 0xE8]), "При");
    }

    #[test]
    fn thai() {
        let thai = codec("874");
        assert_eq!(thai.decode(&[0xA1]), "\u{0E01}");
    }

    #[test]
    fn shift_jis_double_byte() {
        let sjis = codec("932");
        // 0x82A0 is HIRAGANA LETTER A
        assert_eq!(sjis.decode(&[0x82, 0xA0]), "あ");
        // half-width katakana is single-byte in Shift-JIS
        assert_eq!(sjis.decode(&[0xB1]), "\u{FF71}");
    }

    #[test]
    fn gbk_double_byte() {
        let gbk = codec("936");
        assert_eq!(gbk.decode(&[0xD6, 0xD0, 0xCE, 0xC4]), "中文");
    }

    #[test]
    fn big5_double_byte() {
        let big5 = codec("950");
        assert_eq!(big5.decode(&[0xA4, 0xA4]), "中");
    }

    #[test]
    fn trail_outside_window_replaces_two_bytes() {
        let sjis = codec("932");
        // 0x82 is a lead byte; 0x20 is below every trail window
        assert_eq!(sjis.decode(&[0x82, 0x20, 0x41]), "\u{FFFD}A");
    }

    #[test]
    fn unpaired_lead_at_end_replaces_one_byte() {
        let sjis = codec("932");
        assert_eq!(sjis.decode(&[0x41, 0x82]), "A\u{FFFD}");
    }

    #[test]
    fn name_lookup_rules() {
        assert!(CodecFactory::by_name("").is_none());
        assert!(CodecFactory::by_name("12").is_none()); // ambiguous
        assert!(CodecFactory::by_name("13").is_some()); // 1361 - Korean (Johab)
        assert_eq!(codec("1252 - Latin 1").label(), "1252 - Latin 1");
        assert!(CodecFactory::by_name("latin").is_none()); // case-sensitive, no midword
    }

    #[test]
    fn factory_shares_instances() {
        let a = CodecFactory::get(7).unwrap();
        let b = CodecFactory::get(7).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(CodecFactory::get(Codec::COUNT).is_none());
    }
}
