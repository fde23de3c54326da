// Copyright 2025-2026 The lnkscope contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # lnkscope
//!
//! A defensive parser for Microsoft Shell Link (`.lnk`) files, the binary
//! format described by \[MS-SHLLINK\]. The format is little-endian,
//! variant-rich and in several places undocumented; `lnkscope` reads it the
//! way a forensic tool has to: a truncated, malformed or adversarial file
//! never causes an over-read, and partial output is produced whenever a
//! section can be salvaged.
//!
//! # Architecture
//!
//! - **File layer** ([`crate::file`]) - owned byte buffer (capped at
//!   [`MAX_FILE_SIZE`]), cursor-based typed little-endian reads, and the
//!   [`crate::file::Region`] bounds tracker that delimits nested structures.
//! - **Encoding layer** ([`crate::encoding`]) - UTF-16LE transcoding and a
//!   table-driven decoder for fifteen legacy single- and double-byte
//!   codepages.
//! - **Section parsers** ([`crate::sections`]) - ShellLinkHeader,
//!   LinkTargetIdList (seven shell-item variants), LinkInfo, StringData and
//!   ExtraData (twelve block types).
//! - **Output layer** ([`crate::output`]) - an ordered tree of named tagged
//!   values with per-node verbosity, walked depth-first by renderers
//!   (YAML, flat list).
//!
//! # Usage
//!
//! ```rust,no_run
//! use lnkscope::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut lnk = Lnk::open("shortcut.lnk")?;
//! lnk.parse()?;
//! for warning in lnk.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//! let output = lnk.output();
//! let mut yaml = String::new();
//! lnkscope::output::yaml::dump(&mut yaml, &output, None, "shortcut.lnk", Level::Normal).map_err(|e| e.to_string())?;
//! print!("{yaml}");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread safety
//!
//! A [`Lnk`] owns its buffer, cursor and output exclusively; independent
//! files may be parsed on independent threads. The codepage catalogue and
//! all label tables are immutable statics, shared freely.

#[macro_use]
pub(crate) mod error;
pub(crate) mod guid;
pub(crate) mod guids;
pub(crate) mod times;

pub mod encoding;
pub mod file;
pub mod output;
pub mod prelude;
pub mod properties;
pub mod sections;

mod parser;

pub use error::Error;
pub use guid::Guid;
pub use parser::{Lnk, Warning};

/// `Result<T, lnkscope::Error>`, used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Input files are read up to this many bytes; anything beyond is ignored.
///
/// Real-world shell links are a few kilobytes. The cap bounds memory and
/// parse time for arbitrary input.
pub const MAX_FILE_SIZE: usize = 1024 * 1024;
