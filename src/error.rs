//! Crate-wide error type.
//!
//! A small `no_std`-friendly enum with hand-written `Display`/`Error`
//! impls rather than a derive macro, since this crate supports building
//! without `std`.

use alloc::string::String;
use core::fmt;
use core::result;

/// Everything that can go wrong across the four pipeline stages.
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O failure (file not found, unreadable, unwritable).
    #[cfg(feature = "std")]
    Io(std::io::Error),
    /// A `scroll` (de)serialization failure while reading/writing a
    /// container record.
    #[cfg(feature = "alloc")]
    Scroll(scroll::Error),
    /// Bad magic bytes at the head of an AE or PEF container.
    BadMagic([u8; 5]),
    /// A container is structurally malformed (wrong header size, truncated
    /// record table, offset past the end of the blob, ...).
    Malformed(String),
    /// An `extern_segment` reference was never matched to a definition.
    UnresolvedSymbol(String),
    /// The same command header name appeared more than once.
    DuplicateSymbol(String),
    /// An `Exec` image has no `__ImageStart` + `.code64` command header.
    MissingEntrypoint,
    /// An object's architecture didn't match the link target and `-fat`
    /// wasn't passed.
    ArchMismatch { expected: u8, found: u8 },
    /// A source line failed lexical screening or uses an unknown mnemonic.
    Lexical { line: usize, message: String },
    /// An unknown or unbalanced preprocessor directive.
    Directive(String),
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(feature = "alloc")]
impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::Scroll(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "std")]
            Error::Io(err) => write!(f, "i/o error: {err}"),
            #[cfg(feature = "alloc")]
            Error::Scroll(err) => write!(f, "container codec error: {err}"),
            Error::BadMagic(magic) => write!(f, "invalid magic: {magic:02x?}"),
            Error::Malformed(msg) => write!(f, "malformed container: {msg}"),
            Error::UnresolvedSymbol(name) => write!(f, "undefined symbol {name}"),
            Error::DuplicateSymbol(name) => {
                write!(f, "multiple symbols of {name} detected, cannot continue")
            }
            Error::MissingEntrypoint => write!(f, "undefined entrypoint __ImageStart"),
            Error::ArchMismatch { expected, found } => write!(
                f,
                "object is a different kind of architecture ({found:#x}) than target \
                 ({expected:#x}) and output isn't treated as a FAT binary"
            ),
            Error::Lexical { line, message } => write!(f, "{line}: {message}"),
            Error::Directive(msg) => write!(f, "unknown pre-processor directive: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Maps an [`Error`] to the process exit code documented for the CLI
/// surface: `2` for I/O failures, `3` for architecture mismatches, `1`
/// for everything else.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        #[cfg(feature = "std")]
        Error::Io(_) => 2,
        Error::ArchMismatch { .. } => 3,
        _ => 1,
    }
}
