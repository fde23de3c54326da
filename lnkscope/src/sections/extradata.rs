//! ExtraData parsing (MS-SHLLINK 2.5).
//!
//! ExtraData is a trailing list of signature-dispatched blocks: `u32`
//! BlockSize (self-inclusive), `u32` signature, payload. A BlockSize under
//! 8 terminates the list. After every block the cursor is resynchronized
//! to `block_start + BlockSize` unconditionally, so a block that lies
//! about its content cannot desync its successors; an unknown signature is
//! surfaced as opaque bytes, never an error.

use log::debug;

use crate::encoding::utf16le_to_utf8;
use crate::file::Reader;
use crate::output::{Stream, Value};
use crate::properties::{Bitfield, Enumerated, FillAttributesTags, FontFamilyTags, FontPitchTags};
use crate::sections::Warning;

const ENV_VAR: u32 = 0xA000_0001;
const CONSOLE: u32 = 0xA000_0002;
const TRACKER: u32 = 0xA000_0003;
const CONSOLE_FE: u32 = 0xA000_0004;
const SPECIAL_FOLDER: u32 = 0xA000_0005;
const DARWIN: u32 = 0xA000_0006;
const ICON_ENV: u32 = 0xA000_0007;
const SHIM: u32 = 0xA000_0008;
const PROPERTY_STORE: u32 = 0xA000_0009;
const KNOWN_FOLDER: u32 = 0xA000_000B;
const VISTA_ID_LIST: u32 = 0xA000_000C;

/// Parse the ExtraData block list at the cursor. Never fatal: a truncated
/// block leaves its remaining fields unemitted and warns.
pub fn parse(reader: &mut Reader) -> (Stream, Vec<Warning>) {
    let mut out = Stream::new();
    let mut warnings = Vec::new();
    if reader.eof() {
        return (out, warnings);
    }
    loop {
        let block_start = reader.pos();
        let Ok(block_size) = reader.read_u32() else {
            break;
        };
        if block_size < 8 {
            break;
        }
        let Ok(signature) = reader.read_u32() else {
            break;
        };
        let payload = block_size as usize - 8;
        debug!("extra data block {signature:#010X}, {block_size} bytes");

        let (name, body): (&'static str, BlockFn) = match signature {
            ENV_VAR => ("EnvironmentVariableDataBlock", env_var),
            CONSOLE => ("ConsoleDataBlock", console),
            TRACKER => ("TrackerDataBlock", tracker),
            CONSOLE_FE => ("ConsoleFeDataBlock", console_fe),
            SPECIAL_FOLDER => ("SpecialFolderDataBlock", special_folder),
            DARWIN => ("DarwinDataBlock", darwin),
            ICON_ENV => ("IconEnvironmentDataBlock", icon_env),
            SHIM => ("ShimDataBlock", shim),
            PROPERTY_STORE => ("PropertyStoreDataBlock", opaque),
            KNOWN_FOLDER => ("KnownFolderDataBlock", known_folder),
            VISTA_ID_LIST => ("VistaAndAboveIDListDataBlock", opaque),
            _ => ("UnknownExtraDataBlock", opaque),
        };
        let debug_only = matches!(
            signature,
            PROPERTY_STORE | VISTA_ID_LIST
        ) || name == "UnknownExtraDataBlock";

        let mut nested = Stream::new();
        if body(reader, &mut nested, payload).is_none() {
            warnings.push(Warning::new(format!("{name}: block truncated")));
        }
        if !nested.is_empty() {
            if debug_only {
                out.put_debug(name, Value::nested(nested));
            } else {
                out.put(name, Value::nested(nested));
            }
        }

        // resync unconditionally so an under-read cannot desync the loop
        let Some(next) = block_start.checked_add(block_size as usize) else {
            break;
        };
        reader.seek(next);
    }
    (out, warnings)
}

type BlockFn = fn(&mut Reader, &mut Stream, usize) -> Option<()>;

// A0000001: environment variable target
fn env_var(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    o.put("TargetAnsi", Value::ansi(reader.read_exact_ansi(260).ok()?));
    let units = reader.read_exact_unicode(520).ok()?;
    o.put("TargetUnicode", Value::utf8(utf16le_to_utf8(&units)));
    Some(())
}

// A0000007: icon location with environment variables
fn icon_env(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    o.put("TargetAnsi", Value::ansi(reader.read_exact_ansi(260).ok()?));
    let units = reader.read_exact_unicode(520).ok()?;
    o.put("TargetUnicode", Value::utf8(utf16le_to_utf8(&units)));
    Some(())
}

// A0000006: MSI Darwin descriptor; the ANSI copy is specified as ignored
fn darwin(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    let _ansi = reader.read_exact_ansi(260).ok()?;
    let units = reader.read_exact_unicode(520).ok()?;
    o.put("DarwinDataUnicode", Value::utf8(utf16le_to_utf8(&units)));
    Some(())
}

// A0000002: console window settings
fn console(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    let fill = Bitfield::<FillAttributesTags>::new(reader.read_u16().ok()?);
    o.put("FillAttributes", Value::bits(&fill));
    let popup = Bitfield::<FillAttributesTags>::new(reader.read_u16().ok()?);
    o.put("PopupFillAttributes", Value::bits(&popup));
    o.put("ScreenBufferSizeX", Value::int(reader.read_i16().ok()?));
    o.put("ScreenBufferSizeY", Value::int(reader.read_i16().ok()?));
    o.put("WindowSizeX", Value::int(reader.read_i16().ok()?));
    o.put("WindowSizeY", Value::int(reader.read_i16().ok()?));
    o.put("WindowOriginX", Value::int(reader.read_i16().ok()?));
    o.put("WindowOriginY", Value::int(reader.read_i16().ok()?));
    let _unused1 = reader.read_u32().ok()?;
    let _unused2 = reader.read_u32().ok()?;
    o.put("FontSize", Value::int(reader.read_u32().ok()?));
    // FontFamily packs the FF_* family enumeration in bits 4..8 bit-or'd
    // with the TMPF_* pitch bits in the low nibble
    let font_family = reader.read_u32().ok()?;
    let family = Enumerated::<FontFamilyTags>::new(font_family & 0xFFFF_FFF0);
    o.put("FontFamily", Value::enumerated(&family));
    let pitch = Enumerated::<FontPitchTags>::new(font_family & 0x0000_000F);
    o.put("FontPitch", Value::enumerated(&pitch));
    o.put("FontWeight", Value::int(reader.read_u32().ok()?));
    let face_name = reader.read_exact_unicode(64).ok()?;
    o.put("FaceName", Value::utf8(utf16le_to_utf8(&face_name)));
    o.put("CursorSize", Value::int(reader.read_u32().ok()?));
    o.put("FullScreen", Value::int(reader.read_u32().ok()?));
    o.put("QuickEdit", Value::int(reader.read_u32().ok()?));
    o.put("InsertMode", Value::int(reader.read_u32().ok()?));
    o.put("AutoPosition", Value::int(reader.read_u32().ok()?));
    o.put("HistoryBufferSize", Value::int(reader.read_u32().ok()?));
    o.put("NumberOfHistoryBuffers", Value::int(reader.read_u32().ok()?));
    o.put("HistoryNoDup", Value::int(reader.read_u32().ok()?));
    let mut color_table = [0u32; 16];
    for slot in &mut color_table {
        *slot = reader.read_u32().ok()?;
    }
    o.put_debug("ColorTable", Value::dwords(&color_table));
    Some(())
}

// A0000004: console codepage on far-east systems
fn console_fe(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    o.put("CodePage", Value::int(reader.read_u32().ok()?));
    Some(())
}

// A0000005: special folder the target lives in
fn special_folder(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    o.put("SpecialFolderId", Value::int(reader.read_u32().ok()?));
    o.put("Offset", Value::int(reader.read_u32().ok()?));
    Some(())
}

// A000000B: known folder the target lives in
fn known_folder(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    o.put("KnownFolderId", Value::guid(reader.read_guid().ok()?));
    o.put("Offset", Value::int(reader.read_u32().ok()?));
    Some(())
}

// A0000008: application compatibility shim layer
fn shim(reader: &mut Reader, o: &mut Stream, payload: usize) -> Option<()> {
    let units = reader.read_exact_unicode(payload).ok()?;
    o.put("LayerName", Value::utf8(utf16le_to_utf8(&units)));
    Some(())
}

// A0000003: distributed link tracker state
fn tracker(reader: &mut Reader, o: &mut Stream, _payload: usize) -> Option<()> {
    let _length = reader.read_u32().ok()?;
    let _version = reader.read_u32().ok()?;
    o.put("MachineID", Value::ansi(reader.read_exact_ansi(16).ok()?));
    o.put("DroidVolumeId", Value::guid(reader.read_guid().ok()?));
    o.put("DroidFileId", Value::guid(reader.read_guid().ok()?));
    o.put("DroidBirthVolumeId", Value::guid(reader.read_guid().ok()?));
    o.put("DroidBirthFileId", Value::guid(reader.read_guid().ok()?));
    Some(())
}

// PropertyStore, VistaAndAboveIDList and unknown signatures: raw bytes
fn opaque(reader: &mut Reader, o: &mut Stream, payload: usize) -> Option<()> {
    let bytes = reader.read_binary(payload).ok()?;
    o.put("Bytes", Value::bytes(&bytes));
    Some(())
}
