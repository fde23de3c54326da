//! Top-level orchestration: one [`Lnk`] per file.

use std::path::Path;

use log::debug;

use crate::file::Reader;
use crate::output::{Stream, Value};
use crate::sections;
use crate::Result;

pub use crate::sections::Warning;

/// One shell link file: buffer, parse state, output.
///
/// Usage is open → parse → output; the output tree is moved out exactly
/// once. Warnings collect everything non-fatal the defensive paths hit, in
/// file order.
pub struct Lnk {
    reader: Reader,
    output: Stream,
    warnings: Vec<Warning>,
}

impl Lnk {
    /// Open a file, reading at most [`crate::MAX_FILE_SIZE`] bytes.
    ///
    /// # Errors
    /// [`crate::Error::Io`] when the file cannot be opened or read.
    pub fn open(path: impl AsRef<Path>) -> Result<Lnk> {
        Ok(Lnk::from_reader(Reader::from_file(path.as_ref())?))
    }

    /// Parse an in-memory buffer instead of a file.
    #[must_use]
    pub fn from_mem(data: Vec<u8>) -> Lnk {
        Lnk::from_reader(Reader::from_mem(data))
    }

    fn from_reader(reader: Reader) -> Lnk {
        Lnk {
            reader,
            output: Stream::new(),
            warnings: Vec::new(),
        }
    }

    /// Parse the whole file.
    ///
    /// Sections are parsed in file order (header, LinkTargetIdList,
    /// LinkInfo, StringData, ExtraData) but emitted with the IdList moved
    /// behind LinkInfo and StringData: the list is second in the file yet
    /// rarely the interesting part. Sections that produced no fields are
    /// not emitted at all.
    ///
    /// # Errors
    /// Only fatal errors surface here (see [`crate::Error`]); per-section
    /// problems become [`Warning`]s instead.
    pub fn parse(&mut self) -> Result<()> {
        let header = sections::header::parse(&mut self.reader)?;

        let mut root = Stream::new();
        root.put("ShellLinkHeader", Value::nested(header.stream));

        let mut id_list = None;
        if header.link_flags.has_link_target_id_list() {
            let (stream, warnings) = sections::idlist::parse(&mut self.reader)?;
            self.warnings.extend(warnings);
            id_list = Some(stream);
        }

        if header.link_flags.has_link_info() {
            let stream = sections::linkinfo::parse(&mut self.reader)?;
            if !stream.is_empty() {
                root.put("LinkInfo", Value::nested(stream));
            }
        }

        let strings = sections::stringdata::parse(&mut self.reader, &header.link_flags)?;
        if !strings.is_empty() {
            root.put("StringData", Value::nested(strings));
        }

        if let Some(stream) = id_list {
            if !stream.is_empty() {
                root.put("LinkTargetIdList", Value::nested(stream));
            }
        }

        let (extra, warnings) = sections::extradata::parse(&mut self.reader);
        self.warnings.extend(warnings);
        if !extra.is_empty() {
            root.put("ExtraData", Value::nested(extra));
        }

        if !self.warnings.is_empty() {
            debug!("parse finished with {} warning(s)", self.warnings.len());
        }
        debug!("parsed {} bytes into {} sections", self.reader.len(), root.len());

        self.output = root;
        Ok(())
    }

    /// Take the output tree. Meaningful once, after [`Lnk::parse`]; later
    /// calls return an empty tree.
    #[must_use]
    pub fn output(&mut self) -> Stream {
        std::mem::take(&mut self.output)
    }

    /// Everything non-fatal the parse ran into, in file order.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
