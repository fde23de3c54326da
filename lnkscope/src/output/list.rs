//! Flat list rendering of an output tree.
//!
//! One `name<TAB>value` row per leaf; entering a struct emits a blank row
//! and a `/Path/To/Struct/` header. This is the row format the browsable
//! UI consumes, usable directly as console output.

use std::fmt::{self, Write};

use super::{bitfield_string, display_string, hex_words, Form, Level, Stream, Visit};
use crate::encoding::Codec;

/// Render `stream` as tab-separated rows into `out`.
///
/// # Errors
/// Propagates formatting errors from `out`.
pub fn dump<W: Write>(
    out: &mut W,
    stream: &Stream,
    codec: Option<&Codec>,
    level: Level,
) -> fmt::Result {
    let mut dumper = ListDumper {
        out: String::new(),
        path: Vec::new(),
        codec,
    };
    stream.accept(&mut dumper, level);
    out.write_str(&dumper.out)
}

/// Render a byte count the way humans read them.
///
/// Below 1000 bytes the exact count stands alone; above, the first IEC
/// suffix that brings the value under 1000 is used and the exact count is
/// kept in parentheses.
fn file_size(value: i64) -> String {
    if value < 0 {
        return value.to_string();
    }
    if value < 1000 {
        return format!("{value} bytes");
    }
    static SUFFIXES: [(&str, f64); 4] = [
        ("kiB", 1024.0),
        ("MiB", 1024.0 * 1024.0),
        ("GiB", 1024.0 * 1024.0 * 1024.0),
        ("TiB", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ];
    let mut pick = SUFFIXES.len() - 1;
    for (i, (_, denom)) in SUFFIXES.iter().enumerate() {
        if value as f64 / denom < 1000.0 {
            pick = i;
            break;
        }
    }
    let (suffix, denom) = SUFFIXES[pick];
    format!("{:.1} {suffix} ({value} bytes)", value as f64 / denom)
}

/// Local-time rendering in the classic `ctime` layout.
fn local_time(unix: i64) -> String {
    use chrono::TimeZone;

    match chrono::Local.timestamp_opt(unix, 0).single() {
        Some(datetime) => datetime.format("%a %b %e %H:%M:%S %Y").to_string(),
        None => unix.to_string(),
    }
}

struct ListDumper<'a> {
    out: String,
    path: Vec<&'static str>,
    codec: Option<&'a Codec>,
}

impl ListDumper<'_> {
    fn row(&mut self, name: &str, value: &str) {
        self.out.push_str(name);
        self.out.push('\t');
        self.out.push_str(value);
        self.out.push('\n');
    }
}

impl Visit for ListDumper<'_> {
    fn integer(&mut self, name: &'static str, value: i64, form: Form) {
        let rendered = match form {
            Form::Decimal => value.to_string(),
            Form::Hex => format!("0x{:X}", value as u64),
            Form::FileSize => file_size(value),
            Form::UnixTime => local_time(value),
        };
        self.row(name, &rendered);
    }

    fn string(&mut self, name: &'static str, bytes: &[u8], is_utf8: bool) {
        let decoded = display_string(bytes, is_utf8, self.codec);
        self.row(name, &decoded);
    }

    fn enumerated(&mut self, name: &'static str, value: i64, label: Option<&'static str>) {
        let rendered = format!("0x{:X} ({})", value as u64, label.unwrap_or("Unknown"));
        self.row(name, &rendered);
    }

    fn bitfield(&mut self, name: &'static str, value: u64, labels: &[Option<&'static str>]) {
        let rendered = format!("0x{value:X} {}", bitfield_string(value, labels));
        self.row(name, &rendered);
    }

    fn bytes(&mut self, name: &'static str, element_size: u8, elements: &[u64]) {
        let rendered = hex_words(element_size, elements);
        self.row(name, &rendered);
    }

    fn structure(&mut self, name: &'static str, nested: &Stream, level: Level) {
        self.out.push('\n');
        self.path.push(name);
        self.out.push('/');
        for part in &self.path {
            self.out.push_str(part);
            self.out.push('/');
        }
        self.out.push('\n');
        nested.accept(self, level);
        self.path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Value;

    fn render(stream: &Stream, level: Level) -> String {
        let mut out = String::new();
        dump(&mut out, stream, None, level).unwrap();
        out
    }

    #[test]
    fn rows_are_tab_separated() {
        let mut s = Stream::new();
        s.put("IconIndex", Value::int(7u32));
        s.put("Flags", Value::hex(0x1Fu32));
        let text = render(&s, Level::Normal);
        assert!(text.contains("IconIndex\t7\n"));
        assert!(text.contains("Flags\t0x1F\n"));
    }

    #[test]
    fn struct_paths_nest() {
        let mut inner = Stream::new();
        inner.put("Name", Value::utf8("A"));
        let mut mid = Stream::new();
        mid.put("FileShellId", Value::nested(inner));
        let mut root = Stream::new();
        root.put("LinkTargetIdList", Value::nested(mid));

        let text = render(&root, Level::Normal);
        assert!(text.contains("\n/LinkTargetIdList/\n"));
        assert!(text.contains("\n/LinkTargetIdList/FileShellId/\n"));
        assert!(text.contains("Name\tA\n"));
    }

    #[test]
    fn file_sizes_are_human() {
        assert_eq!(file_size(0), "0 bytes");
        assert_eq!(file_size(999), "999 bytes");
        assert_eq!(file_size(4096), "4.0 kiB (4096 bytes)");
        assert_eq!(file_size(5 * 1024 * 1024), "5.0 MiB (5242880 bytes)");
        assert_eq!(file_size(-3), "-3");
    }

    #[test]
    fn enumerated_and_bitfield_rows() {
        let mut s = Stream::new();
        s.put(
            "DriveType",
            Value::Enumerated {
                value: 3,
                label: Some("FIXED"),
            },
        );
        s.put(
            "HotKeyHigh",
            Value::Bitfield {
                value: 0b1,
                labels: &[Some("SHIFT"), Some("CONTROL")],
            },
        );
        let text = render(&s, Level::Normal);
        assert!(text.contains("DriveType\t0x3 (FIXED)\n"));
        assert!(text.contains("HotKeyHigh\t0x1 [ SHIFT ]\n"));
    }

    #[test]
    fn unknown_enumerated_value() {
        let mut s = Stream::new();
        s.put(
            "ShowCommand",
            Value::Enumerated {
                value: 4,
                label: None,
            },
        );
        let text = render(&s, Level::Normal);
        assert!(text.contains("ShowCommand\t0x4 (Unknown)\n"));
    }
}
