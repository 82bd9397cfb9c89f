//! # pdf_ast
//!
//! A parser for the PDF object and file-structure layer, producing an
//! abstract syntax tree suitable for later inspection or rewriting.
//!
//! ## Core Features
//!
//! - **Lexical layer**: whitespace, comments, EOL normalization, numbers,
//!   names with `#hh` escapes, literal and hexadecimal strings
//! - **Objects**: the nine PDF object variants with recursive arrays and
//!   dictionaries, and content-addressed streams whose `/Length` binds the
//!   body byte-for-byte
//! - **File structure**: `n g obj` definitions, classical `xref` tables and
//!   cross-reference streams, the backwards `startxref`/`Prev` walker with
//!   a loop guard, and the whole-document assembler
//! - **Borrowed AST**: stream bodies and number text are views into the
//!   input; decoded payloads live in a per-parse [`Arena`]
//!
//! Filter decoding, encryption, reference resolution, and content-stream
//! interpretation are out of scope; the parser stops at file structure.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_ast::{parse_document, Arena, ObjectParser};
//!
//! let input = b"%PDF-1.4\n1 0 obj << /Kind (demo) >> endobj\nstartxref\n0\n%%EOF\n";
//! let arena = Arena::new();
//! let document = parse_document(input, &arena).expect("well-formed input");
//! assert_eq!(document.revisions[0].body.len(), 1);
//!
//! // Or parse a single object:
//! let parser = ObjectParser::new(&arena);
//! let (_, object) = parser.object(b"[1 2 0 R /Name]").unwrap();
//! assert_eq!(object.as_array().unwrap().len(), 3);
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod arena;
pub mod document;
pub mod lexer;
pub mod object;
pub mod parser;
/// Parser configuration options
pub mod parser_config;
pub mod xref;

// Re-exports
pub use arena::Arena;
pub use document::{parse_document, parse_document_with_options, Document, Header, Revision};
pub use error::{Error, Result};
pub use object::{Dict, IndirectObject, Object, ObjectRef, Real, Stream};
pub use parser::ObjectParser;
pub use parser_config::ParseOptions;
pub use xref::{XrefEntry, XrefEntryKind, XrefIndex, XrefSection, XrefWalk};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
