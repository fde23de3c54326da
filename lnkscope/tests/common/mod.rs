//! Shared builders for synthetic shell link images.

#![allow(dead_code)]

use lnkscope::output::{Level, Node, Stream, Value};

pub const HAS_LINK_TARGET_ID_LIST: u32 = 1 << 0;
pub const HAS_LINK_INFO: u32 = 1 << 1;
pub const HAS_NAME: u32 = 1 << 2;
pub const HAS_RELATIVE_PATH: u32 = 1 << 3;
pub const HAS_WORKING_DIR: u32 = 1 << 4;
pub const HAS_ARGUMENTS: u32 = 1 << 5;
pub const HAS_ICON_LOCATION: u32 = 1 << 6;
pub const IS_UNICODE: u32 = 1 << 7;

/// A minimal valid 76-byte header with the given LinkFlags.
pub fn header(link_flags: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(76);
    bytes.extend_from_slice(&0x4C_u32.to_le_bytes());
    bytes.extend_from_slice(&[
        0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x46,
    ]);
    bytes.extend_from_slice(&link_flags.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 52]);
    assert_eq!(bytes.len(), 76);
    bytes
}

/// Wrap raw item payloads (each already carrying its size prefix) into a
/// LinkTargetIdList: total size prefix + items + terminal item.
pub fn id_list(items: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = items.iter().map(Vec::len).sum::<usize>() + 2;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(total as u16).to_le_bytes());
    for item in items {
        bytes.extend_from_slice(item);
    }
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes
}

/// One shell item: size prefix + payload.
pub fn item(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&((payload.len() + 2) as u16).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// One ExtraData block: self-inclusive size + signature + payload.
pub fn extra_block(signature: u32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
    bytes.extend_from_slice(&signature.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Find a direct child node by name.
pub fn child<'a>(stream: &'a Stream, name: &str) -> Option<&'a Node> {
    stream.nodes().iter().find(|n| n.name == name)
}

/// Unwrap a struct node's nested stream.
pub fn nested<'a>(stream: &'a Stream, name: &str) -> &'a Stream {
    let node = child(stream, name).unwrap_or_else(|| panic!("no node named {name}"));
    match &node.value {
        Value::Struct(inner) => inner,
        other => panic!("{name} is not a struct node: {other:?}"),
    }
}

/// Names of the children visible at the given level.
pub fn names(stream: &Stream, level: Level) -> Vec<&'static str> {
    stream
        .nodes()
        .iter()
        .filter(|n| level == Level::Debug || n.level == Level::Normal)
        .map(|n| n.name)
        .collect()
}

/// The UTF-8 text of a string child.
pub fn text(stream: &Stream, name: &str) -> String {
    let node = child(stream, name).unwrap_or_else(|| panic!("no node named {name}"));
    match &node.value {
        Value::String { bytes, .. } => String::from_utf8_lossy(bytes).into_owned(),
        other => panic!("{name} is not a string node: {other:?}"),
    }
}

/// The integer value of an integer/enumerated child.
pub fn int(stream: &Stream, name: &str) -> i64 {
    let node = child(stream, name).unwrap_or_else(|| panic!("no node named {name}"));
    match &node.value {
        Value::Integer { value, .. } | Value::Enumerated { value, .. } => *value,
        other => panic!("{name} is not an integer node: {other:?}"),
    }
}
