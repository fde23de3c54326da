//! LinkTargetIdList parsing (MS-SHLLINK 2.2).
//!
//! The list is a `u16` total size followed by shell items, each a `u16`
//! size (self-inclusive) plus payload, terminated by a zero-size item. The
//! items themselves are the shell namespace's private business and barely
//! documented; everything here is parsed defensively: every read is
//! guarded by the item's [`Region`], a failure emits what was read, appends
//! a warning and abandons the item, and the outer cursor is always left at
//! the list's declared end.

use log::debug;

use crate::encoding::utf16le_to_utf8;
use crate::file::{Reader, Region};
use crate::guids::{describe_control_panel, describe_shell_folder};
use crate::output::{Stream, Value};
use crate::properties::{
    Enumerated, FileAttributes, FileItemFlags, NetworkItemFlags, NetworkItemTypeTags,
    SortIndexTags, UriFlags, WindowsVersionTags,
};
use crate::sections::Warning;
use crate::Result;

/// Signature of the `0xBEEF0004` extension block.
const BEEF0004: u32 = 0xBEEF_0004;

/// Signature of the sub-item inside a 0x74 user folder delegate item.
const DELEGATE_ITEM_SIGNATURE: u32 = 0x4653_4643;

/// Parse the LinkTargetIdList at the cursor.
///
/// On return the cursor sits at the list's declared end regardless of what
/// the items contained.
///
/// # Errors
/// [`crate::Error::ShortRead`] when the size prefix itself cannot be read
/// and [`crate::Error::BadLength`] when it overflows; everything inside the
/// list degrades to warnings.
pub fn parse(reader: &mut Reader) -> Result<(Stream, Vec<Warning>)> {
    let id_list_size = reader.read_u16()?;
    let mut items = Items {
        reader,
        out: Stream::new(),
        warnings: Vec::new(),
    };
    // IdListSize does not include its own two bytes
    let mut list = Region::new();
    list.set_start(items.reader.pos());
    list.set_len(usize::from(id_list_size), "LinkTargetIdList")?;
    items.run(&mut list);
    items.reader.seek(list.end());
    Ok((items.out, items.warnings))
}

struct Items<'a> {
    reader: &'a mut Reader,
    out: Stream,
    warnings: Vec<Warning>,
}

impl Items<'_> {
    fn warn(&mut self, message: String) {
        debug!("idlist: {message}");
        self.warnings.push(Warning::new(message));
    }

    fn run(&mut self, list: &mut Region) {
        loop {
            let mut item = Region::new();
            item.set_start(list.start());
            if !list.check_read(0, 2) {
                self.warn("LinkTargetIdList: list ends without a terminal item".into());
                return;
            }
            // ItemIdSize does include its own two bytes
            let Ok(item_size) = self.reader.read_u16() else {
                self.warn("LinkTargetIdList: list bounds exceed the file".into());
                return;
            };
            if item_size == 0 {
                // terminal item
                return;
            }
            let item_size = usize::from(item_size);
            if !list.check_read(0, item_size) || !item.set_len_ok(item_size) || !item.pop(2) {
                self.warn(format!(
                    "LinkTargetIdList: item size {item_size} exceeds the remaining list"
                ));
                return;
            }
            let Ok(data) = self.reader.read_binary(item_size - 2) else {
                self.warn("LinkTargetIdList: item extends past the end of the file".into());
                return;
            };
            self.reader.seek(item.start());
            if !item.pop(1) {
                self.warn("LinkTargetIdList: item too small for a class type byte".into());
                return;
            }
            let Ok(clstype) = self.reader.read_u8() else {
                self.warn("LinkTargetIdList: item extends past the end of the file".into());
                return;
            };

            self.dispatch(clstype, &data, item);

            let _ = list.pop(item_size);
            self.reader.seek(list.start());
        }
    }

    fn dispatch(&mut self, clstype: u8, data: &[u8], item: Region) {
        if clstype == 0x1F {
            let (o, ok) = self.with_item(|i, o| i.root_folder(item, o));
            self.emit("FolderShellId", o, None, ok);
        } else if clstype & 0x70 == 0x20 {
            let mut o = Stream::new();
            o.put("Flags", Value::hex(clstype & !0x70));
            self.emit("VolumeShellId", o, Some(data), true);
        } else if clstype & 0x70 == 0x30 {
            let (o, ok) = self.with_item(|i, o| i.file_item(clstype, item, o));
            self.emit("FileShellId", o, Some(data), ok);
        } else if clstype & 0x70 == 0x40 {
            let (o, ok) = self.with_item(|i, o| i.network_item(clstype, item, o));
            self.emit("NetworkLocationShellId", o, Some(data), ok);
        } else if clstype & 0x70 == 0x50 {
            let (o, ok) = self.with_item(|i, o| i.zip_folder_item(item, o));
            self.emit("ZipFolderShellId", o, Some(data), ok);
        } else if clstype & 0x70 == 0x60 {
            let (o, ok) = self.with_item(|i, o| i.uri_item(clstype, item, o));
            self.emit("URIShellId", o, Some(data), ok);
        } else if clstype == 0x74 {
            let (o, ok) = self.with_item(|i, o| i.delegate_item(item, o));
            self.emit("UserFolderDelegate", o, Some(data), ok);
        } else if clstype & 0x70 == 0x70 {
            let (o, ok) = self.with_item(|i, o| i.control_panel_item(item, o));
            self.emit("ControlPanelShellId", o, Some(data), ok);
        } else {
            let mut o = Stream::new();
            o.put("Bytes", Value::bytes(data));
            self.out.put_debug("UnknownShellId", Value::nested(o));
        }
    }

    /// Run one item sub-parser, collecting its partial output stream and
    /// whether it ran to completion.
    fn with_item(
        &mut self,
        body: impl FnOnce(&mut Self, &mut Stream) -> Option<()>,
    ) -> (Stream, bool) {
        let mut o = Stream::new();
        let ok = body(self, &mut o).is_some();
        (o, ok)
    }

    /// Append a finished item node; raw bytes ride along at Debug level.
    fn emit(&mut self, name: &'static str, mut o: Stream, data: Option<&[u8]>, complete: bool) {
        if !complete {
            self.warn(format!("{name}: truncated or malformed item"));
        }
        if let Some(data) = data {
            o.put_debug("Bytes", Value::bytes(data));
        }
        self.out.put(name, Value::nested(o));
    }

    // 0x1F: root folder
    fn root_folder(&mut self, mut b: Region, o: &mut Stream) -> Option<()> {
        if !b.pop(1 + 16) {
            return None;
        }
        let sort_index = Enumerated::<SortIndexTags>::new(self.reader.read_u8().ok()?);
        o.put_debug("SortIndex", Value::enumerated(&sort_index));
        let folder = self.reader.read_guid().ok()?;
        match describe_shell_folder(&folder.to_string()) {
            Some(desc) => {
                o.put("ShellFolder", Value::utf8(desc));
                o.put_debug("ShellFolderGuid", Value::guid(folder));
            }
            None => o.put("ShellFolderGuid", Value::guid(folder)),
        }
        Some(())
    }

    // 0x30: file or folder
    fn file_item(&mut self, clstype: u8, mut b: Region, o: &mut Stream) -> Option<()> {
        let flags = FileItemFlags::new(clstype & !0x70);
        o.put_debug("Flags", Value::bits(&flags));
        // offset of the class type byte, for the pre-XP heuristic below
        let clstype_offset = b.start() - 1;
        if !b.pop(1 + 4 + 4 + 2) {
            return None;
        }
        let _unknown = self.reader.read_u8().ok()?;
        o.put("FileSize", Value::size(self.reader.read_u32().ok()?));
        o.put("ModifiedTime", Value::fattime(self.reader.read_u32().ok()?));
        let attributes = FileAttributes::new(self.reader.read_u16().ok()?);
        o.put("Attributes", Value::bits(&attributes));
        if b.remaining() == 0 {
            return Some(());
        }

        let unicode = flags.has_unicode_strings();
        self.string_field(&mut b, o, "Name", unicode)?;

        // optional alignment byte after the name
        if b.remaining() == 0 {
            return Some(());
        }
        if self.reader.peek().ok()? == 0 {
            self.reader.skip(1).ok()?;
            let _ = b.pop(1);
        }
        if b.remaining() < 2 {
            return Some(());
        }

        // Pre-XP items carry a secondary name here; post-XP items carry a
        // BEEF0004 extension. Disambiguate by reading a tentative extension
        // size and the item's last u16: post-XP iff the size fits in the
        // remaining bytes AND the trailing u16 points back at the size
        // field (as an offset from the item start).
        let maybe_size = self.reader.read_u16().ok()?;
        let version_offset = self.reader.pos();
        self.reader.seek(b.end() - 2);
        let maybe_offset = self.reader.read_u16().ok()?;
        if b.remaining() >= usize::from(maybe_size)
            && usize::from(maybe_offset) == version_offset - clstype_offset
        {
            // post-XP
            if !b.pop(2) {
                return None;
            }
            self.reader.seek(b.start());
            if !b.pop(2 + 4) {
                return None;
            }
            let version = self.reader.read_u16().ok()?;
            o.put_debug("Version", Value::int(version));
            let signature = self.reader.read_u32().ok()?;
            o.put_debug("Signature", Value::hex(signature));
            if signature == BEEF0004 {
                self.beef0004(&mut b, o, version)?;
            }
        } else {
            // pre-XP
            self.reader.seek(b.start());
            self.string_field(&mut b, o, "SecondaryName", unicode)?;
        }
        Some(())
    }

    // 0x40: network location
    fn network_item(&mut self, clstype: u8, mut b: Region, o: &mut Stream) -> Option<()> {
        let net_type = Enumerated::<NetworkItemTypeTags>::new(clstype & !0x70);
        o.put("Type", Value::enumerated(&net_type));
        if !b.pop(1 + 1) {
            return None;
        }
        let _unknown = self.reader.read_u8().ok()?;
        let flags = NetworkItemFlags::new(self.reader.read_u8().ok()?);
        o.put_debug("Flags", Value::bits(&flags));
        if b.remaining() == 0 {
            return Some(());
        }
        self.ansi_field(&mut b, o, "Location")?;
        if flags.has_description() {
            if b.remaining() == 0 {
                return Some(());
            }
            self.ansi_field(&mut b, o, "Description")?;
        }
        if flags.has_comments() {
            if b.remaining() == 0 {
                return Some(());
            }
            let comments = self.reader.read_ansi(b.remaining()).ok()?;
            o.put("Comments", Value::ansi(comments));
        }
        Some(())
    }

    // 0x50: compressed folder child
    fn zip_folder_item(&mut self, mut b: Region, o: &mut Stream) -> Option<()> {
        if !b.pop(1 + 2 + 4 + 8 + 4 + 4 + 4 + 4 + 4) {
            return None;
        }
        let _unknown1 = self.reader.read_u8().ok()?;
        let _unknown2 = self.reader.read_u16().ok()?;
        let _unknown3 = self.reader.read_u32().ok()?;
        let _unknown4 = self.reader.read_u64().ok()?;
        let _unknown5 = self.reader.read_u32().ok()?;
        let _unknown6 = self.reader.read_u32().ok()?;
        o.put("Timestamp", Value::fattime(self.reader.read_u32().ok()?));
        let _unknown7 = self.reader.read_u32().ok()?;
        let timestamp2 = self.reader.read_u32().ok()?;
        if timestamp2 != 0 {
            o.put("Timestamp2", Value::fattime(timestamp2));
        }
        if !b.pop(4) {
            return None;
        }
        let _full_path_size = self.reader.read_u32().ok()?;
        if b.remaining() == 0 {
            return Some(());
        }
        self.unicode_field(&mut b, o, "FullPath")?;
        Some(())
    }

    // 0x60: URI, e.g. an FTP location
    fn uri_item(&mut self, clstype: u8, mut b: Region, o: &mut Stream) -> Option<()> {
        if !b.pop(1) {
            return None;
        }
        let flags = UriFlags::new(self.reader.read_u8().ok()?);
        o.put_debug("Flags", Value::bits(&flags));
        let unicode = flags.is_unicode();
        if clstype & !0x70 == 0x01 && flags.value() & !0x80 == 0 {
            // short shape: four reserved bytes, then the URI
            if !b.pop(4) {
                return None;
            }
            let _reserved = self.reader.read_u32().ok()?;
            self.terminal_uri(&b, o, unicode)?;
            return Some(());
        }
        if !b.pop(2) {
            return None;
        }
        let data_size = self.reader.read_u16().ok()?;
        if data_size > 0 {
            if !b.pop(4 + 4 + 8 + 4 + 4 + 4 + 4 + 4 + 4) {
                return None;
            }
            let _unknown1 = self.reader.read_u32().ok()?;
            let _unknown2 = self.reader.read_u32().ok()?;
            o.put("Timestamp", Value::filetime(self.reader.read_u64().ok()?));
            let _unknown4 = self.reader.read_u32().ok()?;
            let _unknown5 = self.reader.read_u32().ok()?;
            let _unknown6 = self.reader.read_u32().ok()?;
            let _unknown7 = self.reader.read_u32().ok()?;
            let _unknown8 = self.reader.read_u32().ok()?;
            let string1_bytes = self.reader.read_u32().ok()?;
            self.counted_string(&mut b, o, "FTPHostName", string1_bytes, unicode)?;
            if !b.pop(4) {
                return None;
            }
            let string2_bytes = self.reader.read_u32().ok()?;
            self.counted_string(&mut b, o, "FTPUser", string2_bytes, unicode)?;
            if !b.pop(4) {
                return None;
            }
            let string3_bytes = self.reader.read_u32().ok()?;
            self.counted_string(&mut b, o, "FTPPassword", string3_bytes, unicode)?;
        }
        if b.remaining() == 0 {
            return Some(());
        }
        self.terminal_uri(&b, o, unicode)?;
        // more data may follow, including a BEEF0014 block
        Some(())
    }

    // 0x70: control panel entry
    fn control_panel_item(&mut self, mut b: Region, o: &mut Stream) -> Option<()> {
        if !b.pop(1 + 4 + 4 + 2 + 16) {
            return None;
        }
        o.put_debug("SortOrder", Value::hex(self.reader.read_u8().ok()?));
        let _unknown1 = self.reader.read_u32().ok()?;
        let _unknown2 = self.reader.read_u32().ok()?;
        let _unknown3 = self.reader.read_u16().ok()?;
        let guid = self.reader.read_guid().ok()?;
        if let Some(desc) = describe_control_panel(&guid.to_string()) {
            o.put("Category", Value::utf8(desc));
        }
        o.put("GUID", Value::guid(guid));
        Some(())
    }

    // 0x74: user folder delegate, a nested 0x31 item plus delegate GUIDs
    fn delegate_item(&mut self, mut b: Region, o: &mut Stream) -> Option<()> {
        let outer = b;
        if !b.pop(1 + 2 + 4 + 2) {
            return None;
        }
        let mut inner = b;
        let _unknown = self.reader.read_u8().ok()?;
        let delegate_offset = usize::from(self.reader.read_u16().ok()?);
        // offset + 3 to skip the unknown byte and the offset field itself
        if !outer.check_offsets_ok(3, delegate_offset) {
            return None;
        }
        let sub_signature = self.reader.read_u32().ok()?;
        let sub_size = usize::from(self.reader.read_u16().ok()?);
        if sub_signature != DELEGATE_ITEM_SIGNATURE || !b.pop(sub_size) {
            return None;
        }
        {
            // inner item, bounded by its declared size and the delegate offset
            if !inner.set_len_ok(sub_size)
                || inner.end() > outer.end()
                || inner.end() > outer.start() + delegate_offset + 3
                || !inner.pop(1 + 1 + 4 + 4 + 2)
            {
                return None;
            }
            let sub_clstype = self.reader.read_u8().ok()?;
            if sub_clstype != 0x31 {
                return None;
            }
            let _unknown = self.reader.read_u8().ok()?;
            o.put("FileSize", Value::size(self.reader.read_u32().ok()?));
            o.put("ModifiedTime", Value::fattime(self.reader.read_u32().ok()?));
            let attributes = FileAttributes::new(self.reader.read_u16().ok()?);
            o.put("FileAttributes", Value::bits(&attributes));
            let name = self.reader.read_ansi(inner.remaining()).ok()?;
            o.put("PrimaryName", Value::ansi(name));
        }
        self.reader.seek(outer.start() + 3 + delegate_offset);
        if !b.pop(16 + 16) {
            return None;
        }
        let delegate_guid = self.reader.read_guid().ok()?;
        o.put_debug("DelegateGuid", Value::guid(delegate_guid));
        let delegate_class = self.reader.read_guid().ok()?;
        if let Some(desc) = describe_shell_folder(&delegate_class.to_string()) {
            o.put_debug("DelegateClass", Value::utf8(desc));
        }
        o.put_debug("DelegateClassGuid", Value::guid(delegate_class));
        // a BEEF0004 extension block follows
        if !b.pop(2 + 2 + 4) {
            return None;
        }
        let _size = self.reader.read_u16().ok()?;
        let version = self.reader.read_u16().ok()?;
        let signature = self.reader.read_u32().ok()?;
        if signature == BEEF0004 {
            self.beef0004(&mut b, o, version)?;
        }
        Some(())
    }

    /// The versioned `0xBEEF0004` extension payload; fields appear only
    /// from the version that introduced them.
    fn beef0004(&mut self, b: &mut Region, o: &mut Stream, version: u16) -> Option<()> {
        if !b.pop(4 + 4 + 2) {
            return None;
        }
        o.put("CreationTime", Value::fattime(self.reader.read_u32().ok()?));
        o.put("AccessTime", Value::fattime(self.reader.read_u32().ok()?));
        let winver = Enumerated::<WindowsVersionTags>::new(self.reader.read_u16().ok()?);
        o.put_debug("WindowsVersion", Value::enumerated(&winver));
        if version >= 7 {
            if !b.pop(2 + 8 + 8) {
                return None;
            }
            let _unknown = self.reader.read_u16().ok()?;
            let file_reference = self.reader.read_u64().ok()?;
            o.put_debug(
                "MFTEntryIndex",
                Value::int((file_reference & 0x0000_FFFF_FFFF_FFFF) as i64),
            );
            o.put_debug("Sequence", Value::int((file_reference >> 48) as i64));
            let _unknown = self.reader.read_u64().ok()?;
        }
        let mut long_string_size = 0;
        if version >= 3 {
            if !b.pop(2) {
                return None;
            }
            long_string_size = self.reader.read_u16().ok()?;
        }
        if version >= 9 {
            if !b.pop(4) {
                return None;
            }
            let _unknown = self.reader.read_u32().ok()?;
        }
        if version >= 8 {
            if !b.pop(4) {
                return None;
            }
            let _unknown = self.reader.read_u32().ok()?;
        }
        if version >= 3 {
            self.unicode_field(b, o, "LongName")?;
        }
        if version >= 3 && long_string_size > 0 {
            self.ansi_field(b, o, "LocalizedName")?;
        }
        if version >= 7 && long_string_size > 0 {
            self.unicode_field(b, o, "LocalizedNameU")?;
        }
        Some(())
    }

    /// NUL-terminated string in the item's encoding: read, account, emit.
    fn string_field(
        &mut self,
        b: &mut Region,
        o: &mut Stream,
        name: &'static str,
        unicode: bool,
    ) -> Option<()> {
        if unicode {
            self.unicode_field(b, o, name)
        } else {
            self.ansi_field(b, o, name)
        }
    }

    fn unicode_field(&mut self, b: &mut Region, o: &mut Stream, name: &'static str) -> Option<()> {
        let units = self.reader.read_unicode(b.remaining() / 2).ok()?;
        if !b.pop((units.len() + 1) * 2) {
            return None;
        }
        o.put(name, Value::utf8(utf16le_to_utf8(&units)));
        Some(())
    }

    fn ansi_field(&mut self, b: &mut Region, o: &mut Stream, name: &'static str) -> Option<()> {
        let bytes = self.reader.read_ansi(b.remaining()).ok()?;
        if !b.pop(bytes.len() + 1) {
            return None;
        }
        o.put(name, Value::ansi(bytes));
        Some(())
    }

    /// Trailing URI string filling the rest of the item; emitted only when
    /// non-empty.
    fn terminal_uri(&mut self, b: &Region, o: &mut Stream, unicode: bool) -> Option<()> {
        if unicode {
            let units = self.reader.read_unicode(b.remaining() / 2).ok()?;
            if !units.is_empty() {
                o.put("URI", Value::utf8(utf16le_to_utf8(&units)));
            }
        } else {
            let bytes = self.reader.read_ansi(b.remaining()).ok()?;
            if !bytes.is_empty() {
                o.put("URI", Value::ansi(bytes));
            }
        }
        Some(())
    }

    /// Length-prefixed FTP string: exactly `count` bytes, NUL-truncated for
    /// display, emitted only when non-empty.
    fn counted_string(
        &mut self,
        b: &mut Region,
        o: &mut Stream,
        name: &'static str,
        count: u32,
        unicode: bool,
    ) -> Option<()> {
        let count = count as usize;
        if !b.pop(count) {
            return None;
        }
        if unicode {
            let units = self.reader.read_exact_unicode(count).ok()?;
            if !units.is_empty() {
                o.put(name, Value::utf8(utf16le_to_utf8(&units)));
            }
        } else {
            let bytes = self.reader.read_exact_ansi(count).ok()?;
            if !bytes.is_empty() {
                o.put(name, Value::ansi(bytes));
            }
        }
        Some(())
    }
}
