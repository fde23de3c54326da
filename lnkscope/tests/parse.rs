//! End-to-end parses of synthetic shell link images.

mod common;

use common::*;
use lnkscope::output::{yaml, Level, Value};
use lnkscope::{Error, Lnk};

fn parse(bytes: Vec<u8>) -> Lnk {
    let mut lnk = Lnk::from_mem(bytes);
    lnk.parse().expect("parse failed");
    lnk
}

#[test]
fn minimal_header_yields_one_section() {
    // A bare header and nothing else
    let mut lnk = parse(header(0));
    assert!(lnk.warnings().is_empty());
    let root = lnk.output();

    assert_eq!(root.len(), 1);
    let hdr = nested(&root, "ShellLinkHeader");
    assert_eq!(
        names(hdr, Level::Normal),
        vec![
            "LinkFlags",
            "FileAttributes",
            "CreationTime",
            "AccessTime",
            "WriteTime",
            "FileSize"
        ]
    );
    assert_eq!(names(hdr, Level::Debug).len(), 10);
}

#[test]
fn empty_id_list_is_suppressed() {
    // IdListSize covers only the terminal item
    let mut bytes = header(HAS_LINK_TARGET_ID_LIST);
    bytes.extend_from_slice(&id_list(&[]));
    let mut lnk = parse(bytes);
    let root = lnk.output();
    assert!(child(&root, "LinkTargetIdList").is_none());
    assert_eq!(root.len(), 1);
}

#[test]
fn truncated_header_is_fatal() {
    let mut bytes = header(0);
    bytes.truncate(40); // mid-FILETIME
    let mut lnk = Lnk::from_mem(bytes);
    let err = lnk.parse().unwrap_err();
    assert!(matches!(err, Error::ShortRead));
    assert!(lnk.warnings().is_empty());
}

#[test]
fn bad_link_info_header_size_is_fatal() {
    let mut bytes = header(HAS_LINK_INFO);
    let mut info = Vec::new();
    info.extend_from_slice(&0x24_u32.to_le_bytes()); // LinkInfoSize
    info.extend_from_slice(&0x20_u32.to_le_bytes()); // neither 0x1C nor >= 0x24
    info.extend_from_slice(&0u32.to_le_bytes()); // flags
    info.extend_from_slice(&[0u8; 16]); // four offsets
    bytes.extend_from_slice(&info);
    let mut lnk = Lnk::from_mem(bytes);
    assert!(matches!(lnk.parse(), Err(Error::BadHeader { .. })));
}

/// A LinkInfo with VolumeID + LocalBasePath, ANSI form.
fn link_info_bytes() -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(&0x36_u32.to_le_bytes()); // LinkInfoSize
    info.extend_from_slice(&0x1C_u32.to_le_bytes()); // plain header
    info.extend_from_slice(&1u32.to_le_bytes()); // VolumeIDAndLocalBasePath
    info.extend_from_slice(&0x1C_u32.to_le_bytes()); // VolumeIDOffset
    info.extend_from_slice(&0x2E_u32.to_le_bytes()); // LocalBasePathOffset
    info.extend_from_slice(&0u32.to_le_bytes()); // CommonNetworkRelativeLinkOffset
    info.extend_from_slice(&0x35_u32.to_le_bytes()); // CommonPathSuffixOffset
    // VolumeID at 0x1C
    info.extend_from_slice(&0x10_u32.to_le_bytes()); // Size
    info.extend_from_slice(&3u32.to_le_bytes()); // DriveType FIXED
    info.extend_from_slice(&0x1234_5678_u32.to_le_bytes()); // serial
    info.extend_from_slice(&0x10_u32.to_le_bytes()); // VolumeLabelOffset (ANSI)
    info.extend_from_slice(b"C\0"); // label at 0x1C + 0x10
    // LocalBasePath at 0x2E
    info.extend_from_slice(b"C:\\tmp\0");
    // CommonPathSuffix at 0x35
    info.push(0);
    assert_eq!(info.len(), 0x36);
    info
}

#[test]
fn link_info_volume_and_path() {
    let mut bytes = header(HAS_LINK_INFO);
    bytes.extend_from_slice(&link_info_bytes());
    let mut lnk = parse(bytes);
    let root = lnk.output();

    let info = nested(&root, "LinkInfo");
    assert_eq!(int(info, "DriveType"), 3);
    assert_eq!(text(info, "VolumeLabel"), "C");
    assert_eq!(text(info, "LocalBasePath"), "C:\\tmp");
    assert_eq!(text(info, "CommonPathSuffix"), "");
    // the label slot is ANSI, so the renderer may apply a codepage
    let label = child(info, "VolumeLabel").unwrap();
    assert!(matches!(
        label.value,
        Value::String { is_utf8: false, .. }
    ));
}

#[test]
fn string_data_unicode() {
    let mut bytes = header(HAS_NAME | HAS_ARGUMENTS | IS_UNICODE);
    // Name = "Hi"
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&[0x48, 0x00, 0x69, 0x00]);
    // CommandLine = "-x"
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&[0x2D, 0x00, 0x78, 0x00]);
    let mut lnk = parse(bytes);
    let root = lnk.output();

    let strings = nested(&root, "StringData");
    assert_eq!(text(strings, "Name"), "Hi");
    assert_eq!(text(strings, "CommandLine"), "-x");
}

#[test]
fn emission_order_differs_from_file_order() {
    // File order: header, idlist, linkinfo, stringdata, extradata.
    // Emission order: header, linkinfo, stringdata, idlist, extradata.
    let mut bytes = header(
        HAS_LINK_TARGET_ID_LIST | HAS_LINK_INFO | HAS_NAME,
    );
    // one root-folder item: My Computer
    let mut payload = vec![0x1F, 0x50];
    payload.extend_from_slice(&[
        0xE0, 0x4F, 0xD0, 0x20, 0xEA, 0x3A, 0x69, 0x10, 0xA2, 0xD8, 0x08, 0x00, 0x2B, 0x30, 0x30,
        0x9D,
    ]);
    bytes.extend_from_slice(&id_list(&[item(&payload)]));
    bytes.extend_from_slice(&link_info_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.push(b'n');
    bytes.extend_from_slice(&extra_block(0xA000_0004, &936u32.to_le_bytes()));

    let mut lnk = parse(bytes);
    assert!(lnk.warnings().is_empty());
    let root = lnk.output();
    assert_eq!(
        names(&root, Level::Normal),
        vec![
            "ShellLinkHeader",
            "LinkInfo",
            "StringData",
            "LinkTargetIdList",
            "ExtraData"
        ]
    );

    let folder = nested(nested(&root, "LinkTargetIdList"), "FolderShellId");
    assert_eq!(text(folder, "ShellFolder"), "My Computer (Computer)");
    // GUID itself is debug detail when the label is known
    assert_eq!(
        child(folder, "ShellFolderGuid").unwrap().level,
        Level::Debug
    );
}

#[test]
fn identical_bytes_give_identical_trees() {
    let mut bytes = header(HAS_LINK_INFO | HAS_NAME);
    bytes.extend_from_slice(&link_info_bytes());
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(b"abc");

    let render = |bytes: Vec<u8>| {
        let mut lnk = parse(bytes);
        let mut out = String::new();
        yaml::dump(&mut out, &lnk.output(), None, "same.lnk", Level::Debug).unwrap();
        out
    };
    assert_eq!(render(bytes.clone()), render(bytes));
}

#[test]
fn open_reads_from_disk() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&header(0)).unwrap();
    let mut lnk = Lnk::open(file.path()).unwrap();
    lnk.parse().unwrap();
    assert_eq!(lnk.output().len(), 1);

    assert!(matches!(
        Lnk::open(file.path().with_extension("missing")),
        Err(Error::Io(_))
    ));
}

#[test]
fn output_moves_once() {
    let mut lnk = parse(header(0));
    assert_eq!(lnk.output().len(), 1);
    assert_eq!(lnk.output().len(), 0);
}
