//! Document assembler.
//!
//! A PDF is a header `%PDF-x.y` followed by one or more *revisions*, each
//! a body of indirect object definitions, an optional classical
//! cross-reference section with its trailer dictionary, and a `startxref`
//! plus `%%EOF` marker. The strict assembler must consume the entire
//! input; a debug assembler consumes as much as it can and reports the
//! furthest position reached, which only serves to sharpen the error
//! message when the strict parse fails.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::object::IndirectObject;
use crate::parser::ObjectParser;
use crate::parser_config::ParseOptions;
use crate::xref::{self, XrefSection};
use nom::{
    bytes::complete::tag,
    character::complete::one_of,
    combinator::{eof, opt},
    multi::many1,
    IResult,
};
use std::fmt;

/// The PDF version from the `%PDF-x.y` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Major version digit (nonzero)
    pub major: u32,
    /// Minor version digit
    pub minor: u32,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%PDF-{}.{}", self.major, self.minor)
    }
}

/// One body + trailer unit of a (possibly incrementally updated) file.
#[derive(Debug, PartialEq)]
pub struct Revision<'a> {
    /// Indirect object definitions, in file order
    pub body: Vec<IndirectObject<'a>>,
    /// Classical cross-reference section, if this revision carries one
    pub xref: Option<XrefSection<'a>>,
    /// Offset announced by this revision's `startxref`
    pub startxref: u64,
}

/// A fully parsed PDF file.
#[derive(Debug, PartialEq)]
pub struct Document<'a> {
    /// The version header
    pub header: Header,
    /// Revisions in file order (oldest first)
    pub revisions: Vec<Revision<'a>>,
}

/// Parse the `%PDF-x.y` header. The major digit must be nonzero; an
/// end-of-line closes the line.
fn header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, _) = tag(&b"%PDF-"[..])(input)?;
    let (input, major) = one_of("123456789")(input)?;
    let (input, _) = tag(&b"."[..])(input)?;
    let (input, minor) = one_of("0123456789")(input)?;
    let (input, _) = crate::lexer::eol(input)?;
    let major = major as u32 - '0' as u32;
    let minor = minor as u32 - '0' as u32;
    Ok((input, Header { major, minor }))
}

/// One revision: body, optional xref section + trailer, `startxref`,
/// `%%EOF`.
fn revision<'a>(parser: &ObjectParser<'a>, input: &'a [u8]) -> IResult<&'a [u8], Revision<'a>> {
    let (input, body) = parser.body(input)?;
    let (input, section) = opt(|i| xref::classical_section(parser, i))(input)?;
    let (input, startxref) = xref::startxref(input)?;
    let (input, _) = xref::eof_marker(input)?;
    Ok((
        input,
        Revision {
            body,
            xref: section,
            startxref,
        },
    ))
}

fn strict<'a>(parser: &ObjectParser<'a>, input: &'a [u8]) -> IResult<&'a [u8], Document<'a>> {
    let (input, header) = header(input)?;
    let (input, revisions) = many1(|i| revision(parser, i))(input)?;
    let (input, _) = eof(input)?;
    Ok((input, Document { header, revisions }))
}

/// Parse a complete PDF document, consuming the entire input.
///
/// On a grammar failure the debug assembler is run to locate the furthest
/// successful position, and the returned error carries that byte offset
/// ([`Error::ErrorAfter`]); if not even the header parses, the error is
/// [`Error::NoParse`].
pub fn parse_document<'a>(input: &'a [u8], arena: &'a Arena) -> Result<Document<'a>> {
    parse_document_with_options(input, arena, ParseOptions::default())
}

/// [`parse_document`] with explicit [`ParseOptions`].
pub fn parse_document_with_options<'a>(
    input: &'a [u8],
    arena: &'a Arena,
    options: ParseOptions,
) -> Result<Document<'a>> {
    let parser = ObjectParser::with_options(arena, options);
    match strict(&parser, input) {
        Ok((_, document)) => Ok(document),
        Err(_) => match parse_prefix(input, &parser) {
            Some(offset) => Err(Error::ErrorAfter {
                offset: offset as u64,
            }),
            None => Err(Error::NoParse),
        },
    }
}

/// The debug assembler: consume as much of a document as possible.
///
/// Parses the header, then as many complete revisions as will go, then a
/// final partial body. Returns the byte offset reached, or `None` when
/// the header itself does not parse.
pub fn parse_prefix<'a>(input: &'a [u8], parser: &ObjectParser<'a>) -> Option<usize> {
    let (mut rest, _) = header(input).ok()?;
    while let Ok((r, _)) = revision(parser, rest) {
        rest = r;
    }
    if let Ok((r, _)) = parser.body(rest) {
        rest = r;
    }
    Some(input.len() - rest.len())
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for revision in &self.revisions {
            for definition in &revision.body {
                writeln!(f, "{}", definition)?;
            }
            if let Some(section) = &revision.xref {
                writeln!(f, "{}", section)?;
            }
            writeln!(f, "startxref\n{}\n%%EOF", revision.startxref)?;
        }
        Ok(())
    }
}
