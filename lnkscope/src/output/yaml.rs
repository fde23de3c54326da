//! YAML rendering of an output tree.
//!
//! One YAML document per file: `---`, an optional `File:` key naming the
//! input, the tree with two-space indentation per nesting level, and a
//! closing `...`. Enumerated and bitfield nodes emit a human line plus a
//! `_Numeric` twin so scripted consumers never have to parse labels back.

use std::fmt::{self, Write};

use super::{bitfield_string, display_string, hex_words, Form, Level, Stream, Visit};
use crate::encoding::Codec;

/// Render `stream` as one YAML document into `out`.
///
/// `name` is the input file name for the `File:` key; empty omits the key.
/// Non-UTF-8 strings are decoded with `codec` when one is given.
///
/// # Errors
/// Propagates formatting errors from `out`.
pub fn dump<W: Write>(
    out: &mut W,
    stream: &Stream,
    codec: Option<&Codec>,
    name: &str,
    level: Level,
) -> fmt::Result {
    let mut dumper = YamlDumper {
        out: String::new(),
        depth: 0,
        codec,
    };
    dumper.out.push_str("---\n");
    if !name.is_empty() {
        let escaped = escape(name);
        dumper.out.push_str("File: ");
        dumper.out.push_str(&escaped);
        dumper.out.push('\n');
    }
    dumper.out.push('\n');
    stream.accept(&mut dumper, level);
    dumper.out.push_str("...\n");
    out.write_str(&dumper.out)
}

/// Quote and escape a string for YAML output.
///
/// Printable ASCII stays literal; backslash and double quote get their
/// short escapes; everything else becomes `\uXXXX` (or `\UXXXXXXXX` beyond
/// the BMP), so the output is ASCII-clean regardless of input.
fn escape(s: &str) -> String {
    let mut r = String::with_capacity(s.len() + 2);
    r.push('"');
    for c in s.chars() {
        match c {
            '\\' => r.push_str("\\\\"),
            '"' => r.push_str("\\\""),
            ' '..='~' => r.push(c),
            c if (c as u32) <= 0xFFFF => {
                let _ = write!(r, "\\u{:04X}", c as u32);
            }
            c => {
                let _ = write!(r, "\\U{:08X}", c as u32);
            }
        }
    }
    r.push('"');
    r
}

fn iso8601(unix: i64) -> String {
    match chrono::DateTime::from_timestamp(unix, 0) {
        Some(datetime) => datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        None => unix.to_string(),
    }
}

struct YamlDumper<'a> {
    out: String,
    depth: usize,
    codec: Option<&'a Codec>,
}

impl YamlDumper<'_> {
    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn line(&mut self, name: &str, value: &str) {
        self.indent();
        self.out.push_str(name);
        self.out.push_str(": ");
        self.out.push_str(value);
        self.out.push('\n');
    }
}

impl Visit for YamlDumper<'_> {
    fn integer(&mut self, name: &'static str, value: i64, form: Form) {
        let rendered = match form {
            Form::UnixTime => iso8601(value),
            _ => value.to_string(),
        };
        self.line(name, &rendered);
    }

    fn string(&mut self, name: &'static str, bytes: &[u8], is_utf8: bool) {
        let decoded = display_string(bytes, is_utf8, self.codec);
        let escaped = escape(&decoded);
        self.line(name, &escaped);
    }

    fn enumerated(&mut self, name: &'static str, value: i64, label: Option<&'static str>) {
        self.line(name, label.unwrap_or("Unknown"));
        self.indent();
        let _ = writeln!(self.out, "{name}_Numeric: {value}");
    }

    fn bitfield(&mut self, name: &'static str, value: u64, labels: &[Option<&'static str>]) {
        let rendered = bitfield_string(value, labels);
        self.line(name, &rendered);
        self.indent();
        let _ = writeln!(self.out, "{name}_Numeric: {value}");
    }

    fn bytes(&mut self, name: &'static str, element_size: u8, elements: &[u64]) {
        let rendered = hex_words(element_size, elements);
        self.line(name, &rendered);
    }

    fn structure(&mut self, name: &'static str, nested: &Stream, level: Level) {
        self.indent();
        self.out.push_str(name);
        self.out.push_str(":\n");
        self.depth += 1;
        nested.accept(self, level);
        self.depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::CodecFactory;
    use crate::output::Value;

    fn render(stream: &Stream, level: Level) -> String {
        let mut out = String::new();
        dump(&mut out, stream, None, "test.lnk", level).unwrap();
        out
    }

    #[test]
    fn document_frame() {
        let yaml = render(&Stream::new(), Level::Normal);
        assert!(yaml.starts_with("---\nFile: \"test.lnk\"\n\n"));
        assert!(yaml.ends_with("...\n"));
    }

    #[test]
    fn integers_and_times() {
        let mut s = Stream::new();
        s.put("FileSize", Value::size(1234u32));
        s.put("WriteTime", Value::filetime(116_444_736_000_000_000));
        let yaml = render(&s, Level::Normal);
        // YAML keeps sizes numeric; only times are formatted
        assert!(yaml.contains("FileSize: 1234\n"));
        assert!(yaml.contains("WriteTime: 1970-01-01T00:00:00Z\n"));
    }

    #[test]
    fn enumerated_with_numeric_twin() {
        let mut s = Stream::new();
        s.put(
            "ShowCommand",
            Value::Enumerated {
                value: 3,
                label: Some("SHOWMAXIMIZED"),
            },
        );
        let yaml = render(&s, Level::Normal);
        assert!(yaml.contains("ShowCommand: SHOWMAXIMIZED\n"));
        assert!(yaml.contains("ShowCommand_Numeric: 3\n"));
    }

    #[test]
    fn bitfield_lists_set_bits() {
        let mut s = Stream::new();
        s.put(
            "LinkFlags",
            Value::Bitfield {
                value: 0b11,
                labels: &[Some("HasLinkTargetIdList"), Some("HasLinkInfo")],
            },
        );
        let yaml = render(&s, Level::Normal);
        assert!(yaml.contains("LinkFlags: [ HasLinkTargetIdList, HasLinkInfo ]\n"));
        assert!(yaml.contains("LinkFlags_Numeric: 3\n"));
    }

    #[test]
    fn nesting_indents() {
        let mut inner = Stream::new();
        inner.put("Name", Value::utf8("A"));
        let mut root = Stream::new();
        root.put("FileShellId", Value::nested(inner));
        let yaml = render(&root, Level::Normal);
        assert!(yaml.contains("FileShellId:\n  Name: \"A\"\n"));
    }

    #[test]
    fn byte_arrays_are_hex_words() {
        let mut s = Stream::new();
        s.put("Bytes", Value::bytes(&[0x0A, 0xFF]));
        s.put("ColorTable", Value::dwords(&[0x00112233]));
        let yaml = render(&s, Level::Normal);
        assert!(yaml.contains("Bytes: 0a ff\n"));
        assert!(yaml.contains("ColorTable: 00112233\n"));
    }

    #[test]
    fn escaping() {
        let mut s = Stream::new();
        s.put("Name", Value::utf8("a\"b\\c\u{0142}"));
        let yaml = render(&s, Level::Normal);
        assert!(yaml.contains(r#"Name: "a\"b\\c\u0142""#));
    }

    #[test]
    fn codec_applies_to_legacy_strings_only() {
        let codec = CodecFactory::by_name("1251").unwrap();
        let mut s = Stream::new();
        s.put("VolumeLabel", Value::ansi(vec![0xCF]));
        s.put("Name", Value::utf8("П"));
        let mut out = String::new();
        dump(&mut out, &s, Some(&codec), "", Level::Normal).unwrap();
        // both render as the escaped Cyrillic П
        assert_eq!(out.matches("\\u041F").count(), 2);
    }

    #[test]
    fn debug_nodes_filtered() {
        let mut s = Stream::new();
        s.put("Visible", Value::int(1u32));
        s.put_debug("Hidden", Value::int(2u32));
        let normal = render(&s, Level::Normal);
        let debug = render(&s, Level::Debug);
        assert!(!normal.contains("Hidden"));
        assert!(debug.contains("Hidden"));
    }
}
