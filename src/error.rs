//! Error types for the parser.
//!
//! This module defines the failures a parse can end with and the
//! recoverable diagnostics gathered while walking cross-reference chains.

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors and diagnostics that can occur during PDF parsing.
///
/// The cross-reference walker treats its variants as recoverable: they are
/// collected as warnings and the sections gathered so far are preserved.
/// The document assembler treats its variants as fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No terminal `startxref` marker was found scanning back from the
    /// end of the input.
    #[error("startxref not found")]
    StartxrefNotFound,

    /// A cross-reference section announced at the given byte offset
    /// failed to parse in either the classical or the stream form.
    #[error("error parsing xref section at position {offset} (0x{offset:x})")]
    XrefSection {
        /// Byte offset the section was announced at
        offset: u64,
    },

    /// A trailer carried a `/Prev` entry that was not a usable integer
    /// offset.
    #[error("/Prev not an integer")]
    PrevNotInteger,

    /// A `/Prev` pointer failed to strictly decrease past the first hop.
    #[error("/Prev pointer of xref section at {offset} (0x{offset:x}) points forward")]
    PrevPointsForward {
        /// Byte offset of the section whose `/Prev` is at fault
        offset: u64,
    },

    /// The strict assembler failed and the debug assembler could not
    /// recognize even the header.
    #[error("no parse")]
    NoParse,

    /// The strict assembler failed; the debug assembler consumed input
    /// up to the given byte offset.
    #[error("error after position {offset} (0x{offset:x})")]
    ErrorAfter {
        /// Furthest byte offset the debug assembler reached
        offset: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
