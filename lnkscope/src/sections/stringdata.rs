//! StringData parsing (MS-SHLLINK 2.4).
//!
//! Up to five strings, each present only when its header flag is set:
//! Name, RelativePath, WorkingDir, CommandLine, IconLocation. Each is a
//! `u16` character count followed by that many bytes (ANSI) or UTF-16LE
//! code units, with no terminator. A short read here is fatal: the counts
//! come straight from the file and a miss means the header lied.

use crate::encoding::utf16le_to_utf8;
use crate::file::Reader;
use crate::output::{Stream, Value};
use crate::properties::LinkFlags;
use crate::Result;

/// Parse the StringData section at the cursor, guided by the header flags.
///
/// # Errors
/// [`crate::Error::ShortRead`] when a declared string runs past the buffer.
pub fn parse(reader: &mut Reader, flags: &LinkFlags) -> Result<Stream> {
    let mut out = Stream::new();
    let unicode = flags.is_unicode();

    if flags.has_name() {
        out.put("Name", read_string(reader, unicode)?);
    }
    if flags.has_relative_path() {
        out.put("RelativePath", read_string(reader, unicode)?);
    }
    if flags.has_working_dir() {
        out.put("WorkingDir", read_string(reader, unicode)?);
    }
    if flags.has_arguments() {
        out.put("CommandLine", read_string(reader, unicode)?);
    }
    if flags.has_icon_location() {
        out.put("IconLocation", read_string(reader, unicode)?);
    }
    Ok(out)
}

fn read_string(reader: &mut Reader, unicode: bool) -> Result<Value> {
    let count = usize::from(reader.read_u16()?);
    if unicode {
        let units = reader.read_exact_unicode(count * 2)?;
        Ok(Value::utf8(utf16le_to_utf8(&units)))
    } else {
        Ok(Value::ansi(reader.read_exact_ansi(count)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Value as V;
    use crate::Error;

    fn flags(bits: u32) -> LinkFlags {
        LinkFlags::new(bits)
    }

    #[test]
    fn no_flags_no_strings() {
        let mut reader = Reader::from_mem(vec![0xAA; 4]);
        let out = parse(&mut reader, &flags(0)).unwrap();
        assert!(out.is_empty());
        assert_eq!(reader.pos(), 0);
    }

    #[test]
    fn ansi_strings_in_flag_order() {
        // HasName | HasArguments, not unicode
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(b"-x");
        let mut reader = Reader::from_mem(bytes);
        let out = parse(&mut reader, &flags((1 << 2) | (1 << 5))).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.nodes()[0].name, "Name");
        assert_eq!(out.nodes()[1].name, "CommandLine");
        let V::String { bytes, is_utf8 } = &out.nodes()[0].value else {
            panic!("not a string");
        };
        assert_eq!(bytes, b"abc");
        assert!(!*is_utf8);
    }

    #[test]
    fn unicode_string() {
        // IsUnicode | HasName; "Hi" as UTF-16LE
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&[0x48, 0x00, 0x69, 0x00]);
        let mut reader = Reader::from_mem(bytes);
        let out = parse(&mut reader, &flags((1 << 2) | (1 << 7))).unwrap();
        let V::String { bytes, is_utf8 } = &out.nodes()[0].value else {
            panic!("not a string");
        };
        assert_eq!(bytes, b"Hi");
        assert!(*is_utf8);
    }

    #[test]
    fn truncated_string_is_fatal() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&10u16.to_le_bytes());
        bytes.extend_from_slice(b"abc");
        let mut reader = Reader::from_mem(bytes);
        assert!(matches!(
            parse(&mut reader, &flags(1 << 2)),
            Err(Error::ShortRead)
        ));
    }
}
