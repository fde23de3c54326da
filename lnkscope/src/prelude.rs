//! Convenient re-exports of the most commonly used types.
//!
//! ```rust,no_run
//! use lnkscope::prelude::*;
//!
//! let mut lnk = Lnk::open("shortcut.lnk")?;
//! lnk.parse()?;
//! # Ok::<(), lnkscope::Error>(())
//! ```

/// The error type for all lnkscope operations
pub use crate::Error;

/// The result type used throughout lnkscope
pub use crate::Result;

/// Main entry point: one parsed shell link
pub use crate::Lnk;

/// A non-fatal parse problem
pub use crate::Warning;

/// Codepage decoding for legacy strings
pub use crate::encoding::{Codec, CodecFactory};

/// The output tree and its renderer interface
pub use crate::output::{Form, Level, Stream, Value, Visit};

/// GUID value type
pub use crate::Guid;
