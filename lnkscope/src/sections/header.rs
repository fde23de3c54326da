//! ShellLinkHeader parsing (MS-SHLLINK 2.1).
//!
//! The header is the only section parsed non-defensively: it is 76 fixed
//! bytes, and its LinkFlags decide which sections follow, so anything wrong
//! here is fatal.

use log::debug;

use crate::file::Reader;
use crate::output::{Stream, Value};
use crate::properties::{
    Bitfield, Enumerated, FileAttributes, HotKeyHighTags, HotKeyLowTags, LinkFlags,
    ShowCommandTags,
};
use crate::Result;

/// The header CLSID every shell link starts with.
const LNK_CLSID: &str = "00021401-0000-0000-C000-000000000046";

/// Fixed header size, which doubles as the magic size field value.
const HEADER_SIZE: u32 = 0x4C;

/// Parsed header: the flags the orchestrator routes on, plus the emitted
/// field stream.
#[derive(Debug)]
pub struct Header {
    /// LinkFlags word; decides section presence and string encoding.
    pub link_flags: LinkFlags,
    /// The header's output sub-tree.
    pub stream: Stream,
}

/// Parse the 76-byte header at the cursor.
///
/// # Errors
/// [`crate::Error::BadHeader`] on size or CLSID mismatch,
/// [`crate::Error::BadFlags`] when unknown LinkFlags bits are set, and
/// [`crate::Error::ShortRead`] when the buffer ends inside the header.
pub fn parse(reader: &mut Reader) -> Result<Header> {
    let mut out = Stream::new();

    let header_size = reader.read_u32()?;
    if header_size != HEADER_SIZE {
        return Err(bad_header!(
            "Wrong header size, should be 0x4C, got {header_size:#X}"
        ));
    }
    let clsid = reader.read_guid()?;
    if clsid.to_string() != LNK_CLSID {
        return Err(bad_header!(
            "Wrong magic number, expected {LNK_CLSID}, got {clsid}"
        ));
    }

    let link_flags = LinkFlags::new(reader.read_u32()?);
    if !link_flags.verify() {
        // Invalid link flags are fatal: they define the structure of the
        // rest of the file.
        return Err(bad_flags!(
            "Link flags are not valid: {:#X}, invalid bits are {:#X}",
            link_flags.value(),
            link_flags.invalid_bits()
        ));
    }
    out.put("LinkFlags", Value::bits(&link_flags));

    let attributes = FileAttributes::new(reader.read_u32()?);
    out.put("FileAttributes", Value::bits(&attributes));

    out.put("CreationTime", Value::filetime(reader.read_u64()?));
    out.put("AccessTime", Value::filetime(reader.read_u64()?));
    out.put("WriteTime", Value::filetime(reader.read_u64()?));
    out.put("FileSize", Value::size(reader.read_u32()?));
    out.put_debug("IconIndex", Value::int(reader.read_u32()?));

    let show_command = Enumerated::<ShowCommandTags>::new(reader.read_u32()?);
    out.put_debug("ShowCommand", Value::enumerated(&show_command));

    let hot_key_low = Enumerated::<HotKeyLowTags>::new(reader.read_u8()?);
    out.put_debug("HotKeyLow", Value::enumerated(&hot_key_low));
    let hot_key_high = Bitfield::<HotKeyHighTags>::new(reader.read_u8()?);
    out.put_debug("HotKeyHigh", Value::bits(&hot_key_high));

    let _reserved1 = reader.read_u16()?;
    let _reserved2 = reader.read_u32()?;
    let _reserved3 = reader.read_u32()?;

    debug!("header parsed, link flags {:#010X}", link_flags.value());

    Ok(Header {
        link_flags,
        stream: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Level;
    use crate::Error;

    /// A minimal valid 76-byte header with the given flags.
    pub(crate) fn header_bytes(link_flags: u32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(76);
        bytes.extend_from_slice(&0x4C_u32.to_le_bytes());
        bytes.extend_from_slice(&[
            0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x46,
        ]);
        bytes.extend_from_slice(&link_flags.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 52]);
        assert_eq!(bytes.len(), 76);
        bytes
    }

    #[test]
    fn minimal_header() {
        let mut reader = Reader::from_mem(header_bytes(0));
        let header = parse(&mut reader).unwrap();
        assert_eq!(reader.pos(), 76);
        assert!(!header.link_flags.has_link_target_id_list());

        // Six fields at Normal level, ten in total.
        let normal = header
            .stream
            .nodes()
            .iter()
            .filter(|n| n.level == Level::Normal)
            .count();
        assert_eq!(normal, 6);
        assert_eq!(header.stream.len(), 10);
    }

    #[test]
    fn wrong_size_is_bad_header() {
        let mut bytes = header_bytes(0);
        bytes[0] = 0x40;
        let mut reader = Reader::from_mem(bytes);
        assert!(matches!(parse(&mut reader), Err(Error::BadHeader { .. })));
    }

    #[test]
    fn wrong_clsid_is_bad_header() {
        let mut bytes = header_bytes(0);
        bytes[4] = 0xFF;
        let mut reader = Reader::from_mem(bytes);
        let err = parse(&mut reader).unwrap_err();
        assert!(matches!(err, Error::BadHeader { .. }));
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn unknown_flag_bits_are_bad_flags() {
        let mut reader = Reader::from_mem(header_bytes(1 << 27));
        assert!(matches!(parse(&mut reader), Err(Error::BadFlags { .. })));
    }

    #[test]
    fn truncated_header_is_short_read() {
        let mut bytes = header_bytes(0);
        bytes.truncate(40); // mid-CreationTime
        let mut reader = Reader::from_mem(bytes);
        assert!(matches!(parse(&mut reader), Err(Error::ShortRead)));
    }
}
