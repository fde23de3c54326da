//! Enumerated and bitfield property model.
//!
//! Nearly every scalar in a shell link is either an enumeration (a raw
//! integer whose meaning comes from a closed table) or a bitfield (per-bit
//! labels plus a mask of bits that must never be set). [`Enumerated`] and
//! [`Bitfield`] pair the raw value with a static table supplied by a tag
//! type, so the section parsers stay table-free and the renderers get both
//! the number and its description.

use std::marker::PhantomData;

/// Static `(value, label)` table behind an [`Enumerated`] wrapper.
///
/// Tables are sorted by key; with at most a few dozen entries a linear scan
/// is fine.
pub trait EnumTags {
    /// Sorted `(raw value, label)` pairs.
    const TABLE: &'static [(i64, &'static str)];
}

/// Static per-bit labels behind a [`Bitfield`] wrapper.
pub trait BitTags {
    /// One label slot per bit, low bit first; `None` marks reserved bits.
    const LABELS: &'static [Option<&'static str>];
    /// Mask of bits that are invalid in a well-formed file.
    const INVALID_BITS: u64;
}

/// A raw integer paired with a static description table.
#[derive(Debug, Clone, Copy)]
pub struct Enumerated<T: EnumTags> {
    value: i64,
    _tags: PhantomData<T>,
}

impl<T: EnumTags> Enumerated<T> {
    /// Wrap a raw value.
    pub fn new(value: impl Into<i64>) -> Enumerated<T> {
        Enumerated {
            value: value.into(),
            _tags: PhantomData,
        }
    }

    /// The raw value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The label for the raw value, if the table knows it.
    #[must_use]
    pub fn describe(&self) -> Option<&'static str> {
        T::TABLE
            .iter()
            .find(|(key, _)| *key == self.value)
            .map(|(_, label)| *label)
    }

    /// Whether the raw value appears in the table at all.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.describe().is_some()
    }
}

/// Raw bits paired with per-bit labels and an invalid-bit mask.
#[derive(Debug, Clone, Copy)]
pub struct Bitfield<T: BitTags> {
    bits: u64,
    _tags: PhantomData<T>,
}

impl<T: BitTags> Bitfield<T> {
    /// Wrap raw bits.
    pub fn new(bits: impl Into<u64>) -> Bitfield<T> {
        Bitfield {
            bits: bits.into(),
            _tags: PhantomData,
        }
    }

    /// The raw bits.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.bits
    }

    /// Bit width of the field (the label table length).
    #[must_use]
    pub fn num_bits(&self) -> u32 {
        T::LABELS.len() as u32
    }

    /// Whether a single bit is set.
    #[must_use]
    pub fn bit(&self, bit: u32) -> bool {
        (self.bits >> bit) & 1 != 0
    }

    /// The invalid bits that are actually set in this value.
    #[must_use]
    pub fn invalid_bits(&self) -> u64 {
        self.bits & T::INVALID_BITS
    }

    /// `true` when no invalid bit is set.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.invalid_bits() == 0
    }

    /// Per-bit view: `(bit, label, is_set)` triples, low bit first.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<&'static str>, bool)> + '_ {
        T::LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| (i as u32, *label, self.bit(i as u32)))
    }

    /// The static label table, for handing to the output tree.
    #[must_use]
    pub fn labels(&self) -> &'static [Option<&'static str>] {
        T::LABELS
    }
}

// Header tables (MS-SHLLINK 2.1)
//------------------------------------------------------------------------

/// ShowCommand values the format defines; everything else means SHOWNORMAL.
#[derive(Debug, Clone, Copy)]
pub struct ShowCommandTags;

impl EnumTags for ShowCommandTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x1, "SHOWNORMAL"),
        (0x3, "SHOWMAXIMIZED"),
        (0x7, "SHOWMINNOACTIVE"),
    ];
}

/// Virtual-key codes valid in the low hot key byte.
#[derive(Debug, Clone, Copy)]
pub struct HotKeyLowTags;

impl EnumTags for HotKeyLowTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x00, "None"),
        (0x30, "0"),
        (0x31, "1"),
        (0x32, "2"),
        (0x33, "3"),
        (0x34, "4"),
        (0x35, "5"),
        (0x36, "6"),
        (0x37, "7"),
        (0x38, "8"),
        (0x39, "9"),
        (0x41, "A"),
        (0x42, "B"),
        (0x43, "C"),
        (0x44, "D"),
        (0x45, "E"),
        (0x46, "F"),
        (0x47, "G"),
        (0x48, "H"),
        (0x49, "I"),
        (0x4A, "J"),
        (0x4B, "K"),
        (0x4C, "L"),
        (0x4D, "M"),
        (0x4E, "N"),
        (0x4F, "O"),
        (0x50, "P"),
        (0x51, "Q"),
        (0x52, "R"),
        (0x53, "S"),
        (0x54, "T"),
        (0x55, "U"),
        (0x56, "V"),
        (0x57, "W"),
        (0x58, "X"),
        (0x59, "Y"),
        (0x70, "F1"),
        (0x71, "F2"),
        (0x72, "F3"),
        (0x73, "F4"),
        (0x74, "F5"),
        (0x75, "F6"),
        (0x76, "F7"),
        (0x77, "F8"),
        (0x78, "F9"),
        (0x79, "F10"),
        (0x7A, "F11"),
        (0x7B, "F12"),
        (0x7C, "F13"),
        (0x7D, "F14"),
        (0x7E, "F15"),
        (0x7F, "F16"),
        (0x80, "F17"),
        (0x81, "F18"),
        (0x82, "F19"),
        (0x83, "F20"),
        (0x84, "F21"),
        (0x85, "F22"),
        (0x86, "F23"),
        (0x87, "F24"),
        (0x88, "NUM_LOCK"),
        (0x89, "SCROLL_LOCK"),
    ];
}

/// Modifier bits in the high hot key byte; bits 3..8 are reserved.
#[derive(Debug, Clone, Copy)]
pub struct HotKeyHighTags;

impl BitTags for HotKeyHighTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("SHIFT"),
        Some("CONTROL"),
        Some("ALT"),
        None,
        None,
        None,
        None,
        None,
    ];
    const INVALID_BITS: u64 = 0b11111 << 3;
}

/// The 32 LinkFlags bits. Bit 11 and bits 26..32 must be clear; the rest
/// of the word decides which sections follow the header.
#[derive(Debug, Clone, Copy)]
pub struct LinkFlagsTags;

impl BitTags for LinkFlagsTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("HasLinkTargetIdList"),
        Some("HasLinkInfo"),
        Some("HasName"),
        Some("HasRelativePath"),
        Some("HasWorkingDir"),
        Some("HasArguments"),
        Some("HasIconLocation"),
        Some("IsUnicode"),
        Some("ForceNoLinkInfo"),
        Some("HasExpString"),
        Some("RunInSeparateProcess"),
        Some("Unused1"),
        Some("HasDarwinId"),
        Some("RunAsUser"),
        Some("HasExpIcon"),
        Some("NoPidIAlias"),
        Some("Unused2"),
        Some("RunWithShimLayer"),
        Some("ForceNoLinkTrack"),
        Some("EnableTargetMetadata"),
        Some("DisableLinkPathTracking"),
        Some("DisableKnownFolderTracking"),
        Some("DisableKnownFolderAlias"),
        Some("AllowLinkToLink"),
        Some("UnaliasOnSave"),
        Some("PreferEnvironmentPath"),
        None,
        None,
        None,
        None,
        None,
        None,
    ];
    const INVALID_BITS: u64 = (1 << 11) | (0b111111 << 26);
}

/// LinkFlags with the bit accessors the orchestrator needs.
pub type LinkFlags = Bitfield<LinkFlagsTags>;

impl LinkFlags {
    /// A LinkTargetIdList section follows the header.
    #[must_use]
    pub fn has_link_target_id_list(&self) -> bool {
        self.bit(0)
    }

    /// A LinkInfo section is present.
    #[must_use]
    pub fn has_link_info(&self) -> bool {
        self.bit(1)
    }

    /// The NAME_STRING StringData entry is present.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.bit(2)
    }

    /// The RELATIVE_PATH StringData entry is present.
    #[must_use]
    pub fn has_relative_path(&self) -> bool {
        self.bit(3)
    }

    /// The WORKING_DIR StringData entry is present.
    #[must_use]
    pub fn has_working_dir(&self) -> bool {
        self.bit(4)
    }

    /// The COMMAND_LINE_ARGUMENTS StringData entry is present.
    #[must_use]
    pub fn has_arguments(&self) -> bool {
        self.bit(5)
    }

    /// The ICON_LOCATION StringData entry is present.
    #[must_use]
    pub fn has_icon_location(&self) -> bool {
        self.bit(6)
    }

    /// StringData entries are UTF-16LE rather than codepage bytes.
    #[must_use]
    pub fn is_unicode(&self) -> bool {
        self.bit(7)
    }
}

/// FILE_ATTRIBUTE_* bits; bits 3, 6 and everything from 15 up are reserved.
#[derive(Debug, Clone, Copy)]
pub struct FileAttributesTags;

impl BitTags for FileAttributesTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("READONLY"),
        Some("HIDDEN"),
        Some("SYSTEM"),
        Some("Reserved1"),
        Some("DIRECTORY"),
        Some("ARCHIVE"),
        Some("Reserved2"),
        Some("NORMAL"),
        Some("TEMPORARY"),
        Some("SPARSE_FILE"),
        Some("REPARSE_POINT"),
        Some("COMPRESSED"),
        Some("OFFLINE"),
        Some("NOT_CONTENT_INDEXED"),
        Some("ENCRYPTED"),
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    ];
    const INVALID_BITS: u64 = (1 << 3) | (1 << 6) | (0x1FFFF << 15);
}

/// File attributes as they appear in the header (32-bit) and in 0x30 shell
/// items (low 16 bits of the same word).
pub type FileAttributes = Bitfield<FileAttributesTags>;

// LinkTargetIdList tables (shell item variants)
//------------------------------------------------------------------------

/// Sort-index byte of a 0x1F root folder item.
#[derive(Debug, Clone, Copy)]
pub struct SortIndexTags;

impl EnumTags for SortIndexTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x00, "Internet Explorer"),
        (0x42, "Libraries"),
        (0x44, "Users"),
        (0x48, "My Documents"),
        (0x50, "My Computer"),
        (0x58, "My Network Places"),
        (0x60, "Recycle Bin"),
        (0x68, "Internet Explorer"),
        (0x80, "My Games"),
    ];
}

/// Class-type low nibble of a 0x30 file/folder item.
#[derive(Debug, Clone, Copy)]
pub struct FileItemFlagsTags;

impl BitTags for FileItemFlagsTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("IsDirectory"),
        Some("IsFile"),
        Some("HasUnicodeStrings"),
        None,
        None,
        None,
        None,
        Some("HasClassId"),
    ];
    const INVALID_BITS: u64 = 0b0111_1000;
}

/// 0x30 item flags with the accessor the string reads depend on.
pub type FileItemFlags = Bitfield<FileItemFlagsTags>;

impl FileItemFlags {
    /// Names inside this item are UTF-16LE.
    #[must_use]
    pub fn has_unicode_strings(&self) -> bool {
        self.bit(2)
    }
}

/// Location class of a 0x40 network item.
#[derive(Debug, Clone, Copy)]
pub struct NetworkItemTypeTags;

impl EnumTags for NetworkItemTypeTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x01, "Domain/Workgroup Name"),
        (0x02, "Server UNC Path"),
        (0x03, "Share UNC Path"),
        (0x06, "Microsoft Windows Network"),
        (0x07, "Entire Network"),
        (0x0D, "Network Places / Generic"),
        (0x0E, "Network Places / Root"),
    ];
}

/// Presence flags of a 0x40 network item; only bits 6 and 7 are known.
#[derive(Debug, Clone, Copy)]
pub struct NetworkItemFlagsTags;

impl BitTags for NetworkItemFlagsTags {
    const LABELS: &'static [Option<&'static str>] = &[
        None,
        None,
        None,
        None,
        None,
        None,
        Some("HasComments"),
        Some("HasDescription"),
    ];
    const INVALID_BITS: u64 = 0b0011_1111;
}

/// 0x40 item flags with their presence accessors.
pub type NetworkItemFlags = Bitfield<NetworkItemFlagsTags>;

impl NetworkItemFlags {
    /// A comments string follows the location.
    #[must_use]
    pub fn has_comments(&self) -> bool {
        self.bit(6)
    }

    /// A description string follows the location.
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.bit(7)
    }
}

/// Leading flags byte of a 0x60 URI item.
#[derive(Debug, Clone, Copy)]
pub struct UriFlagsTags;

impl BitTags for UriFlagsTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("Flag0x01"),
        Some("Flag0x02"),
        None,
        None,
        None,
        None,
        None,
        Some("IsUnicode"),
    ];
    const INVALID_BITS: u64 = 0;
}

/// 0x60 item flags with the string-width accessor.
pub type UriFlags = Bitfield<UriFlagsTags>;

impl UriFlags {
    /// Strings inside this item are UTF-16LE.
    #[must_use]
    pub fn is_unicode(&self) -> bool {
        self.bit(7)
    }
}

/// Windows version tag inside a `0xBEEF0004` extension block.
#[derive(Debug, Clone, Copy)]
pub struct WindowsVersionTags;

impl EnumTags for WindowsVersionTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x0014, "Windows XP or 2003"),
        (0x0026, "Windows Vista"),
        (0x002A, "Windows 7, 8.0"),
        (0x002E, "Windows 8.1, 10"),
    ];
}

// LinkInfo tables (MS-SHLLINK 2.3)
//------------------------------------------------------------------------

/// The two LinkInfoFlags bits; everything above them must be clear.
#[derive(Debug, Clone, Copy)]
pub struct LinkInfoFlagsTags;

impl BitTags for LinkInfoFlagsTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("VolumeIDAndLocalBasePath"),
        Some("CommonNetworkRelativeLinkAndPathSuffix"),
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    ];
    const INVALID_BITS: u64 = 0xFFFF_FFFC;
}

/// LinkInfoFlags with the presence accessors.
pub type LinkInfoFlags = Bitfield<LinkInfoFlagsTags>;

impl LinkInfoFlags {
    /// A VolumeID structure and LocalBasePath string are present.
    #[must_use]
    pub fn has_volume_id_and_local_base_path(&self) -> bool {
        self.bit(0)
    }

    /// A CommonNetworkRelativeLink structure is present.
    #[must_use]
    pub fn has_common_network_relative_link(&self) -> bool {
        self.bit(1)
    }
}

/// VolumeID drive types.
#[derive(Debug, Clone, Copy)]
pub struct DriveTypeTags;

impl EnumTags for DriveTypeTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x0, "UNKNOWN"),
        (0x1, "NO_ROOT_DIR"),
        (0x2, "REMOVABLE"),
        (0x3, "FIXED"),
        (0x4, "REMOTE"),
        (0x5, "CDROM"),
        (0x6, "RAMDISK"),
    ];
}

/// CommonNetworkRelativeLink flags; anything above the low two bits is fatal.
#[derive(Debug, Clone, Copy)]
pub struct CnrlFlagsTags;

impl BitTags for CnrlFlagsTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("ValidDevice"),
        Some("ValidNetType"),
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    ];
    const INVALID_BITS: u64 = 0xFFFF_FFFC;
}

/// CommonNetworkRelativeLink flags with the presence accessors.
pub type CnrlFlags = Bitfield<CnrlFlagsTags>;

impl CnrlFlags {
    /// A DeviceName string is present.
    #[must_use]
    pub fn has_device_name(&self) -> bool {
        self.bit(0)
    }
}

/// WNNC_NET_* network provider identifiers.
#[derive(Debug, Clone, Copy)]
pub struct NetworkProviderTags;

impl EnumTags for NetworkProviderTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x001A_0000, "AVID"),
        (0x001B_0000, "DOCUSPACE"),
        (0x001C_0000, "MANGOSOFT"),
        (0x001D_0000, "SERNET"),
        (0x001E_0000, "RIVERFRONT1"),
        (0x001F_0000, "RIVERFRONT2"),
        (0x0020_0000, "DECORB"),
        (0x0021_0000, "PROTSTOR"),
        (0x0022_0000, "FJ_REDIR"),
        (0x0023_0000, "DISTINCT"),
        (0x0024_0000, "TWINS"),
        (0x0025_0000, "RDR2SAMPLE"),
        (0x0026_0000, "CSC"),
        (0x0027_0000, "3IN1"),
        (0x0029_0000, "EXTENDNET"),
        (0x002A_0000, "STAC"),
        (0x002B_0000, "FOXBAT"),
        (0x002C_0000, "YAHOO"),
        (0x002D_0000, "EXIFS"),
        (0x002E_0000, "DAV"),
        (0x002F_0000, "KNOWARE"),
        (0x0030_0000, "OBJECT_DIRE"),
        (0x0031_0000, "MASFAX"),
        (0x0032_0000, "HOB_NFS"),
        (0x0033_0000, "SHIVA"),
        (0x0034_0000, "IBMAL"),
        (0x0035_0000, "LOCK"),
        (0x0036_0000, "TERMSRV"),
        (0x0037_0000, "SRT"),
        (0x0038_0000, "QUINCY"),
        (0x0039_0000, "OPENAFS"),
        (0x003A_0000, "AVID1"),
        (0x003B_0000, "DFS"),
        (0x003C_0000, "KWNP"),
        (0x003D_0000, "ZENWORKS"),
        (0x003E_0000, "DRIVEONWEB"),
        (0x003F_0000, "VMWARE"),
        (0x0040_0000, "RSFX"),
        (0x0041_0000, "MFILES"),
        (0x0042_0000, "MS_NFS"),
        (0x0043_0000, "GOOGLE"),
    ];
}

// ExtraData tables (MS-SHLLINK 2.5)
//------------------------------------------------------------------------

/// Console fill attributes. 16-bit field, labels only in the low byte; the
/// reserved high byte must verify as zero.
#[derive(Debug, Clone, Copy)]
pub struct FillAttributesTags;

impl BitTags for FillAttributesTags {
    const LABELS: &'static [Option<&'static str>] = &[
        Some("FOREGROUND_BLUE"),
        Some("FOREGROUND_GREEN"),
        Some("FOREGROUND_RED"),
        Some("FOREGROUND_INTENSITY"),
        Some("BACKGROUND_BLUE"),
        Some("BACKGROUND_GREEN"),
        Some("BACKGROUND_RED"),
        Some("BACKGROUND_INTENSITY"),
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    ];
    const INVALID_BITS: u64 = 0xFF00;
}

/// Console font families (high bits of the FontFamily word).
#[derive(Debug, Clone, Copy)]
pub struct FontFamilyTags;

impl EnumTags for FontFamilyTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x0000, "DONTCARE"),
        (0x0010, "ROMAN"),
        (0x0020, "SWISS"),
        (0x0030, "MODERN"),
        (0x0040, "SCRIPT"),
        (0x0050, "DECORATIVE"),
    ];
}

/// Console font pitch (low byte of the FontFamily word).
#[derive(Debug, Clone, Copy)]
pub struct FontPitchTags;

impl EnumTags for FontPitchTags {
    const TABLE: &'static [(i64, &'static str)] = &[
        (0x0000, "NONE"),
        (0x0001, "FIXED_PITCH"),
        (0x0002, "VECTOR"),
        (0x0004, "TRUETYPE"),
        (0x0008, "DEVICE"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerated_describe_and_valid() {
        let show = Enumerated::<ShowCommandTags>::new(3u32);
        assert_eq!(show.describe(), Some("SHOWMAXIMIZED"));
        assert!(show.valid());

        let show = Enumerated::<ShowCommandTags>::new(4u32);
        assert_eq!(show.describe(), None);
        assert!(!show.valid());
    }

    #[test]
    fn bitfield_verify() {
        let flags = LinkFlags::new(0b1000_0001u32); // IsUnicode | HasLinkTargetIdList
        assert!(flags.verify());
        assert!(flags.has_link_target_id_list());
        assert!(flags.is_unicode());
        assert!(!flags.has_link_info());

        let flags = LinkFlags::new(1u32 << 11);
        assert!(!flags.verify());
        assert_eq!(flags.invalid_bits(), 1 << 11);

        let flags = LinkFlags::new(1u32 << 26);
        assert!(!flags.verify());
    }

    #[test]
    fn bitfield_iteration() {
        let hot = Bitfield::<HotKeyHighTags>::new(0b101u8);
        let set: Vec<_> = hot
            .iter()
            .filter(|(_, _, on)| *on)
            .map(|(bit, label, _)| (bit, label))
            .collect();
        assert_eq!(set, vec![(0, Some("SHIFT")), (2, Some("ALT"))]);
        assert_eq!(hot.num_bits(), 8);
    }

    #[test]
    fn reserved_bits_have_no_labels() {
        let attrs = FileAttributes::new(1u32 << 20);
        assert!(!attrs.verify());
        let (bit, label, on) = attrs.iter().nth(20).unwrap();
        assert_eq!(bit, 20);
        assert_eq!(label, None);
        assert!(on);
    }

    #[test]
    fn fill_attributes_reserved_byte() {
        let fill = Bitfield::<FillAttributesTags>::new(0x0007u16);
        assert!(fill.verify());
        let fill = Bitfield::<FillAttributesTags>::new(0x0107u16);
        assert!(!fill.verify());
        assert_eq!(fill.num_bits(), 16);
    }

    #[test]
    fn network_provider_lookup() {
        let provider = Enumerated::<NetworkProviderTags>::new(0x0043_0000u32);
        assert_eq!(provider.describe(), Some("GOOGLE"));
    }

    #[test]
    fn linkinfo_flag_accessors() {
        let flags = LinkInfoFlags::new(0b01u32);
        assert!(flags.has_volume_id_and_local_base_path());
        assert!(!flags.has_common_network_relative_link());
        assert!(flags.verify());
        assert!(!LinkInfoFlags::new(0b100u32).verify());
    }
}
