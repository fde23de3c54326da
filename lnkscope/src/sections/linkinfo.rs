//! LinkInfo parsing (MS-SHLLINK 2.3).
//!
//! LinkInfo is offset-indexed rather than sequential: a header carries
//! offsets to an optional VolumeID block, an optional
//! CommonNetworkRelativeLink block and several strings, all relative to the
//! structure start. Offsets here come from the header the section parser
//! already validated, so a violation means the file is corrupt and the
//! whole section fails with a fatal error.

use log::debug;

use crate::encoding::utf16le_to_utf8;
use crate::file::{Reader, Region};
use crate::output::{Stream, Value};
use crate::properties::{CnrlFlags, DriveTypeTags, Enumerated, LinkInfoFlags, NetworkProviderTags};
use crate::Result;

/// Parse the LinkInfo structure at the cursor. On success the cursor is
/// left at the structure's declared end.
///
/// # Errors
/// [`crate::Error::BadHeader`] for an impossible LinkInfoHeaderSize,
/// [`crate::Error::BadFlags`] for unknown CommonNetworkRelativeLink flag
/// bits, [`crate::Error::BadOffset`]/[`crate::Error::BadLength`] for
/// out-of-range offsets and lengths, [`crate::Error::ShortRead`] for
/// truncation.
pub fn parse(reader: &mut Reader) -> Result<Stream> {
    let mut out = Stream::new();
    let mut region = Region::new();
    region.set_start(reader.pos());

    let link_info_size = reader.read_u32()?;
    let header_size = reader.read_u32()?;
    region.set_len(link_info_size as usize, "LinkInfo")?;

    let flags = LinkInfoFlags::new(reader.read_u32()?);
    out.put_debug("LinkInfoFlags", Value::bits(&flags));

    let volume_id_offset = reader.read_u32()? as usize;
    let local_base_path_offset = reader.read_u32()? as usize;
    let cnrl_offset = reader.read_u32()? as usize;
    let common_path_suffix_offset = reader.read_u32()? as usize;

    // 0x1C: plain header; >= 0x24: two extra Unicode offsets follow
    let extended = match header_size {
        0x1C => false,
        size if size >= 0x24 => true,
        size => {
            return Err(bad_header!(
                "Wrong Link Info Header size, expected 0x1C or >=0x24, got {size:#X}"
            ))
        }
    };
    let (base_path_uni_offset, suffix_uni_offset) = if extended {
        (reader.read_u32()? as usize, reader.read_u32()? as usize)
    } else {
        (0, 0)
    };

    if flags.has_volume_id_and_local_base_path() {
        volume_id(reader, &region, volume_id_offset, &mut out)?;

        if extended {
            let base = offset_unicode(reader, &region, base_path_uni_offset, 0, "LocalBasePathUnicode")?;
            let suffix =
                offset_unicode(reader, &region, suffix_uni_offset, 0, "CommonPathSuffixUnicode")?;
            out.put("LocalBasePath", Value::utf8(base));
            out.put("CommonPathSuffix", Value::utf8(suffix));
        } else {
            let base = offset_ansi(reader, &region, local_base_path_offset, 0, "LocalBasePath")?;
            let suffix = offset_ansi(
                reader,
                &region,
                common_path_suffix_offset,
                0,
                "CommonPathSuffix",
            )?;
            out.put("LocalBasePath", Value::ansi(base));
            out.put("CommonPathSuffix", Value::ansi(suffix));
        }
    }
    if flags.has_common_network_relative_link() {
        network_relative_link(reader, &region, cnrl_offset, &mut out)?;
    }

    debug!("link info parsed, {} bytes", link_info_size);
    reader.seek(region.end());
    Ok(out)
}

/// VolumeID block: drive type, serial, and the volume label in the ANSI or
/// Unicode slot.
fn volume_id(
    reader: &mut Reader,
    region: &Region,
    offset: usize,
    out: &mut Stream,
) -> Result<()> {
    // 0x10 is the minimum VolumeID size
    region.check_offsets(offset, 0x10, "VolumeID")?;
    reader.seek(region.start() + offset);

    let size = reader.read_u32()? as usize;
    region.check_offsets(offset, size, "VolumeIDSize")?;

    let drive_type = Enumerated::<DriveTypeTags>::new(reader.read_u32()?);
    out.put("DriveType", Value::enumerated(&drive_type));
    out.put_debug("DriveSerialNumber", Value::int(reader.read_u32()?));

    let label_offset = reader.read_u32()? as usize;
    let label_offset_unicode = reader.read_u32()? as usize;
    // A Unicode label slot exists exactly when the ANSI offset is 0x14,
    // i.e. points directly past the offset pair.
    if label_offset == 0x14 {
        let label = offset_unicode(reader, region, offset, label_offset_unicode, "VolumeLabelUnicode")?;
        out.put("VolumeLabel", Value::utf8(label));
    } else {
        let label = offset_ansi(reader, region, offset, label_offset, "VolumeLabel")?;
        out.put("VolumeLabel", Value::ansi(label));
    }
    Ok(())
}

/// CommonNetworkRelativeLink block: share name, provider, optional device.
fn network_relative_link(
    reader: &mut Reader,
    region: &Region,
    offset: usize,
    out: &mut Stream,
) -> Result<()> {
    // 0x14 is the minimum CommonNetworkRelativeLink size
    region.check_offsets(offset, 0x14, "CommonNetworkRelativeLinkOffset")?;
    reader.seek(region.start() + offset);

    let size = reader.read_u32()? as usize;
    region.check_offsets(offset, size, "CommonNetworkRelativeLinkSize")?;

    let flags = CnrlFlags::new(reader.read_u32()?);
    if !flags.verify() {
        // fatal, the unknown bits would invalidate the offsets below
        return Err(bad_flags!(
            "CommonNetworkRelativeLink flags are not valid: {:#X}, invalid bits are {:#X}",
            flags.value(),
            flags.invalid_bits()
        ));
    }
    out.put("CommonNetworkRelativeLinkFlags", Value::bits(&flags));

    let net_name_offset = reader.read_u32()? as usize;
    let device_name_offset = reader.read_u32()? as usize;
    let provider = Enumerated::<NetworkProviderTags>::new(reader.read_u32()?);
    out.put("NetworkProviderType", Value::enumerated(&provider));

    // Unicode offsets exist exactly when the ANSI net name does not
    // immediately follow the fixed part.
    let extended = net_name_offset > 0x14;
    let (net_name_uni, device_name_uni) = if extended {
        (reader.read_u32()? as usize, reader.read_u32()? as usize)
    } else {
        (0, 0)
    };

    if extended {
        let name = offset_unicode(reader, region, offset, net_name_uni, "NetNameUnicode")?;
        out.put("NetName", Value::utf8(name));
        if flags.has_device_name() {
            let device = offset_unicode(reader, region, offset, device_name_uni, "DeviceNameUnicode")?;
            out.put("DeviceName", Value::utf8(device));
        }
    } else {
        let name = offset_ansi(reader, region, offset, net_name_offset, "NetName")?;
        out.put("NetName", Value::ansi(name));
        if flags.has_device_name() {
            let device = offset_ansi(reader, region, offset, device_name_offset, "DeviceName")?;
            out.put("DeviceName", Value::ansi(device));
        }
    }
    Ok(())
}

/// Read a NUL-terminated 8-bit string at `region.start() + off1 + off2`.
fn offset_ansi(
    reader: &mut Reader,
    region: &Region,
    off1: usize,
    off2: usize,
    field_name: &str,
) -> Result<Vec<u8>> {
    region.check_offsets(off1, off2, field_name)?;
    reader.seek(region.start() + off1 + off2);
    reader.read_ansi(region.max_len(off1, off2))
}

/// Read a NUL-terminated UTF-16LE string at `region.start() + off1 + off2`
/// and transcode it.
fn offset_unicode(
    reader: &mut Reader,
    region: &Region,
    off1: usize,
    off2: usize,
    field_name: &str,
) -> Result<String> {
    region.check_offsets(off1, off2, field_name)?;
    reader.seek(region.start() + off1 + off2);
    let units = reader.read_unicode(region.max_len(off1, off2) / 2)?;
    Ok(utf16le_to_utf8(&units))
}
