//! The neutral tagged-value tree the renderers consume.
//!
//! Section parsers append named values to a [`Stream`]; renderers walk the
//! finished tree depth-first through the [`Visit`] trait. Each node carries
//! a [`Level`] so the default view stays short and `--all` exposes the
//! plumbing fields. Order is observable: traversal yields nodes in
//! insertion order at every nesting level.

pub mod list;
pub mod yaml;

use crate::properties::{BitTags, Bitfield, EnumTags, Enumerated};
use crate::times::{fat_to_unix, filetime_to_unix};
use crate::Guid;

/// Node verbosity. Renderers show `Normal` nodes always and `Debug` nodes
/// only when asked for everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Shown by default.
    Normal,
    /// Shown only at debug verbosity.
    Debug,
}

/// Preferred rendering form of an integer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// Plain decimal.
    Decimal,
    /// Hexadecimal with `0x` prefix.
    Hex,
    /// Byte count, rendered human-readable where the format allows.
    FileSize,
    /// Unix timestamp, rendered as a calendar date.
    UnixTime,
}

/// One typed value in the output tree.
#[derive(Debug)]
pub enum Value {
    /// An integer with a preferred rendering form.
    Integer {
        /// The value; `i64` can hold every integer the format defines.
        value: i64,
        /// How renderers should show it.
        form: Form,
    },
    /// A string. When `is_utf8` is false the bytes are in an unknown legacy
    /// codepage and the renderer applies the caller-selected codec.
    String {
        /// Raw string bytes.
        bytes: Vec<u8>,
        /// Whether `bytes` is already UTF-8.
        is_utf8: bool,
    },
    /// An integer with a closed value table.
    Enumerated {
        /// The raw value.
        value: i64,
        /// The table label, if the value is known.
        label: Option<&'static str>,
    },
    /// A bit set with per-bit labels.
    Bitfield {
        /// The raw bits.
        value: u64,
        /// One label slot per bit, low bit first; `None` marks reserved bits.
        labels: &'static [Option<&'static str>],
    },
    /// An opaque array of fixed-width elements, rendered as hex words.
    Bytes {
        /// Element width in bytes: 1, 2 or 4.
        element_size: u8,
        /// The elements, widened.
        elements: Vec<u64>,
    },
    /// A nested structure.
    Struct(Stream),
}

impl Value {
    /// A decimal integer.
    #[must_use]
    pub fn int(value: impl Into<i64>) -> Value {
        Value::Integer {
            value: value.into(),
            form: Form::Decimal,
        }
    }

    /// A hexadecimal integer.
    #[must_use]
    pub fn hex(value: impl Into<i64>) -> Value {
        Value::Integer {
            value: value.into(),
            form: Form::Hex,
        }
    }

    /// A byte count.
    #[must_use]
    pub fn size(value: impl Into<i64>) -> Value {
        Value::Integer {
            value: value.into(),
            form: Form::FileSize,
        }
    }

    /// A Windows FILETIME, converted to Unix seconds.
    #[must_use]
    pub fn filetime(ticks: u64) -> Value {
        Value::Integer {
            value: filetime_to_unix(ticks),
            form: Form::UnixTime,
        }
    }

    /// A packed FAT date/time, converted to Unix seconds.
    #[must_use]
    pub fn fattime(fat: u32) -> Value {
        Value::Integer {
            value: fat_to_unix(fat),
            form: Form::UnixTime,
        }
    }

    /// An already-UTF-8 string.
    #[must_use]
    pub fn utf8(s: impl Into<String>) -> Value {
        Value::String {
            bytes: s.into().into_bytes(),
            is_utf8: true,
        }
    }

    /// A legacy-codepage byte string.
    #[must_use]
    pub fn ansi(bytes: Vec<u8>) -> Value {
        Value::String {
            bytes,
            is_utf8: false,
        }
    }

    /// A GUID, rendered canonically.
    #[must_use]
    pub fn guid(guid: Guid) -> Value {
        Value::utf8(guid.to_string())
    }

    /// An enumerated property.
    #[must_use]
    pub fn enumerated<T: EnumTags>(prop: &Enumerated<T>) -> Value {
        Value::Enumerated {
            value: prop.value(),
            label: prop.describe(),
        }
    }

    /// A bitfield property.
    #[must_use]
    pub fn bits<T: BitTags>(prop: &Bitfield<T>) -> Value {
        Value::Bitfield {
            value: prop.value(),
            labels: prop.labels(),
        }
    }

    /// An opaque byte array.
    #[must_use]
    pub fn bytes(bytes: &[u8]) -> Value {
        Value::Bytes {
            element_size: 1,
            elements: bytes.iter().map(|b| u64::from(*b)).collect(),
        }
    }

    /// An array of 32-bit words.
    #[must_use]
    pub fn dwords(words: &[u32]) -> Value {
        Value::Bytes {
            element_size: 4,
            elements: words.iter().map(|w| u64::from(*w)).collect(),
        }
    }

    /// A nested structure.
    #[must_use]
    pub fn nested(stream: Stream) -> Value {
        Value::Struct(stream)
    }
}

/// A named, levelled value.
#[derive(Debug)]
pub struct Node {
    /// Field name; always a literal from the format description.
    pub name: &'static str,
    /// Verbosity of this node.
    pub level: Level,
    /// The payload.
    pub value: Value,
}

/// Ordered sequence of named values; the unit the renderers consume.
#[derive(Debug, Default)]
pub struct Stream {
    nodes: Vec<Node>,
}

/// Depth-first renderer interface: one callback per node kind.
///
/// For struct nodes the visitor drives the recursion itself by calling
/// [`Stream::accept`] on the nested stream, so it can wrap the walk with
/// indentation or path bookkeeping.
pub trait Visit {
    /// An integer node.
    fn integer(&mut self, name: &'static str, value: i64, form: Form);
    /// A string node.
    fn string(&mut self, name: &'static str, bytes: &[u8], is_utf8: bool);
    /// An enumerated node.
    fn enumerated(&mut self, name: &'static str, value: i64, label: Option<&'static str>);
    /// A bitfield node.
    fn bitfield(&mut self, name: &'static str, value: u64, labels: &[Option<&'static str>]);
    /// A fixed-width element array node.
    fn bytes(&mut self, name: &'static str, element_size: u8, elements: &[u64]);
    /// A nested structure node.
    fn structure(&mut self, name: &'static str, nested: &Stream, level: Level);
}

impl Stream {
    /// An empty stream.
    #[must_use]
    pub fn new() -> Stream {
        Stream::default()
    }

    /// Number of nodes at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The nodes at this level, in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Append a Normal-level value.
    pub fn put(&mut self, name: &'static str, value: Value) {
        self.nodes.push(Node {
            name,
            level: Level::Normal,
            value,
        });
    }

    /// Append a Debug-level value.
    pub fn put_debug(&mut self, name: &'static str, value: Value) {
        self.nodes.push(Node {
            name,
            level: Level::Debug,
            value,
        });
    }

    /// Walk this level in insertion order, filtered by `level`.
    pub fn accept(&self, visitor: &mut dyn Visit, level: Level) {
        for node in &self.nodes {
            if level == Level::Normal && node.level == Level::Debug {
                continue;
            }
            match &node.value {
                Value::Integer { value, form } => visitor.integer(node.name, *value, *form),
                Value::String { bytes, is_utf8 } => visitor.string(node.name, bytes, *is_utf8),
                Value::Enumerated { value, label } => {
                    visitor.enumerated(node.name, *value, *label);
                }
                Value::Bitfield { value, labels } => {
                    visitor.bitfield(node.name, *value, labels);
                }
                Value::Bytes {
                    element_size,
                    elements,
                } => visitor.bytes(node.name, *element_size, elements),
                Value::Struct(nested) => visitor.structure(node.name, nested, level),
            }
        }
    }
}

/// Decode a string node's bytes for display: UTF-8 passthrough, codec
/// decoding for legacy bytes, lossy passthrough when no codec is selected.
pub(super) fn display_string(
    bytes: &[u8],
    is_utf8: bool,
    codec: Option<&crate::encoding::Codec>,
) -> String {
    if is_utf8 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    match codec {
        Some(codec) => codec.decode(bytes),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Render the set bits of a bitfield as `[ A, B ]`; reserved bits show as
/// `Unknown`.
pub(super) fn bitfield_string(value: u64, labels: &[Option<&'static str>]) -> String {
    let set: Vec<&str> = labels
        .iter()
        .enumerate()
        .filter(|(bit, _)| (value >> bit) & 1 != 0)
        .map(|(_, label)| label.unwrap_or("Unknown"))
        .collect();
    format!("[ {} ]", set.join(", "))
}

/// Render an element array as space-separated fixed-width hex words.
pub(super) fn hex_words(element_size: u8, elements: &[u64]) -> String {
    let nibbles = usize::from(element_size) * 2;
    let words: Vec<String> = elements
        .iter()
        .map(|e| format!("{e:0nibbles$x}", nibbles = nibbles))
        .collect();
    words.join(" ")
}
