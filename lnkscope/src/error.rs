use thiserror::Error;

macro_rules! bad_header {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::BadHeader {
            message: format!($fmt $(, $arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! bad_flags {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::BadFlags {
            message: format!($fmt $(, $arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! bad_length {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::BadLength {
            message: format!($fmt $(, $arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! bad_offset {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::BadOffset {
            message: format!($fmt $(, $arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The error type covering everything this library can return.
///
/// The taxonomy follows the structure of the file format: the fixed header
/// is load-bearing (its flags decide which later sections exist), so header
/// problems are fatal; most other malformations degrade to warnings inside
/// the section that hit them.
#[derive(Error, Debug)]
pub enum Error {
    /// The file could not be opened or read.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The fixed 76-byte header is wrong: bad size field or CLSID mismatch.
    ///
    /// Nothing past the header can be located without it, so this is fatal.
    #[error("Bad header - {file}:{line}: {message}")]
    BadHeader {
        /// What was wrong with the header
        message: String,
        /// Source file where the mismatch was detected
        file: &'static str,
        /// Source line where the mismatch was detected
        line: u32,
    },

    /// Unknown bits are set in a flags field that controls downstream layout.
    ///
    /// Raised for `LinkFlags` in the header and for
    /// `CommonNetworkRelativeLinkFlags`, both of which gate the presence of
    /// later offsets; guessing would desynchronize the whole parse.
    #[error("Bad flags - {file}:{line}: {message}")]
    BadFlags {
        /// Which flags field and which bits were invalid
        message: String,
        /// Source file where the mismatch was detected
        file: &'static str,
        /// Source line where the mismatch was detected
        line: u32,
    },

    /// A declared structure length overflows when added to its base offset.
    #[error("Bad length - {file}:{line}: {message}")]
    BadLength {
        /// Which field carried the overflowing length
        message: String,
        /// Source file where the overflow was detected
        file: &'static str,
        /// Source line where the overflow was detected
        line: u32,
    },

    /// A sub-field offset points outside its enclosing structure region.
    #[error("Bad offset - {file}:{line}: {message}")]
    BadOffset {
        /// Which field carried the out-of-range offset
        message: String,
        /// Source file where the violation was detected
        file: &'static str,
        /// Source line where the violation was detected
        line: u32,
    },

    /// The buffer ended before a required field could be read.
    ///
    /// Inside defensive regions this is converted into a warning that
    /// terminates the current variant; at the header level it is fatal.
    #[error("Short read: buffer ended before a required field")]
    ShortRead,
}
