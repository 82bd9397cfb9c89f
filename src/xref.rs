//! Cross-reference sections and the backwards startxref walker.
//!
//! A cross-reference section maps object numbers to byte offsets. Two
//! forms exist: the classical `xref` table with fixed-width 20-byte
//! entries followed by a `trailer` dictionary, and (PDF 1.5+) a
//! cross-reference stream, an indirect stream object whose dictionary
//! declares `/Type /XRef`. Both are normalized to [`XrefSection`]; stream
//! bodies are kept raw, their decoding is a collaborator concern.
//!
//! The walker locates the terminal `startxref` marker by scanning back
//! from the end of the input, then follows the `/Prev` chain. Offsets must
//! strictly decrease past the first hop (the first hop alone may point
//! forward, for linearized files); a violation stops the walk with a
//! diagnostic but keeps the sections already gathered.

use crate::error::Error;
use crate::lexer::{self, keyword};
use crate::object::{Dict, Object};
use crate::parser::ObjectParser;
use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    character::complete::one_of,
    combinator::{eof, map},
    multi::many0,
    IResult,
};
use std::fmt;

/// Kind of a classical cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntryKind {
    /// Entry for an object in use (`n`)
    InUse,
    /// Entry for a free object (`f`)
    Free,
}

/// One 20-byte entry of a classical cross-reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    /// Byte offset of the object (or next free object number for `f`)
    pub offset: u64,
    /// Generation number
    pub generation: u32,
    /// In use or free
    pub kind: XrefEntryKind,
}

impl XrefEntry {
    /// Create an in-use entry.
    pub fn in_use(offset: u64, generation: u32) -> Self {
        Self {
            offset,
            generation,
            kind: XrefEntryKind::InUse,
        }
    }

    /// Create a free entry.
    pub fn free(offset: u64, generation: u32) -> Self {
        Self {
            offset,
            generation,
            kind: XrefEntryKind::Free,
        }
    }

    /// Whether this entry marks an object in use.
    pub fn is_in_use(&self) -> bool {
        self.kind == XrefEntryKind::InUse
    }
}

/// A subsection of a classical table: `first-object-number count` on its
/// own line, then the entries.
///
/// The declared count is retained but not enforced against the entry
/// list; the entries are whatever the fixed-width grammar matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefSubsection {
    /// Number of the first object covered
    pub start: u64,
    /// Declared entry count
    pub count: u64,
    /// The entries actually present
    pub entries: Vec<XrefEntry>,
}

/// The entries-or-body half of a cross-reference section.
#[derive(Debug, Clone, PartialEq)]
pub enum XrefData<'a> {
    /// Classical table subsections
    Table(Vec<XrefSubsection>),
    /// Raw body of a cross-reference stream (undecoded)
    Stream(&'a [u8]),
}

/// A cross-reference section normalized from either form: the entries (or
/// raw stream body) and the trailer dictionary.
///
/// For the stream form the trailer is the stream's own dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct XrefSection<'a> {
    /// Entries or raw stream body
    pub data: XrefData<'a>,
    /// Trailer dictionary
    pub trailer: Dict<'a>,
}

/// Result of a cross-reference walk: sections newest-first, plus the
/// diagnostics gathered along the way.
#[derive(Debug)]
pub struct XrefWalk<'a> {
    /// Sections in walk order (newest first)
    pub sections: Vec<XrefSection<'a>>,
    /// Recoverable diagnostics; empty on a clean walk
    pub warnings: Vec<Error>,
}

/// Exactly `n` ASCII digits, as a value.
fn fixed_digits(n: usize) -> impl Fn(&[u8]) -> IResult<&[u8], u64> {
    move |input| {
        let (rest, raw) = take(n)(input)?;
        if !raw.iter().all(u8::is_ascii_digit) {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Digit,
            )));
        }
        let value = raw.iter().fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));
        Ok((rest, value))
    }
}

/// Entry terminator: `SP CR`, `SP LF`, or `CRLF`. Two bytes, always.
fn entry_eol(input: &[u8]) -> IResult<&[u8], ()> {
    map(
        alt((tag(&b" \r"[..]), tag(&b" \n"[..]), tag(&b"\r\n"[..]))),
        |_| (),
    )(input)
}

/// One fixed-width entry: ten-digit offset, space, five-digit generation,
/// space, `n` or `f`, terminator. Not whitespace-tolerant in the middle.
fn entry(input: &[u8]) -> IResult<&[u8], XrefEntry> {
    let (input, offset) = fixed_digits(10)(input)?;
    let (input, _) = tag(&b" "[..])(input)?;
    let (input, generation) = fixed_digits(5)(input)?;
    let (input, _) = tag(&b" "[..])(input)?;
    let (input, kind) = one_of("nf")(input)?;
    let (input, _) = entry_eol(input)?;
    let kind = match kind {
        'n' => XrefEntryKind::InUse,
        _ => XrefEntryKind::Free,
    };
    Ok((
        input,
        XrefEntry {
            offset,
            generation: generation as u32,
            kind,
        },
    ))
}

/// Subsection header: `first-object-number count` with a single space,
/// then an end-of-line.
fn subsection_header(input: &[u8]) -> IResult<&[u8], (u64, u64)> {
    let (input, start) = lexer::digits_u64(input)?;
    let (input, _) = tag(&b" "[..])(input)?;
    let (input, count) = lexer::digits_u64(input)?;
    let (input, _) = lexer::eol(input)?;
    Ok((input, (start, count)))
}

fn subsection(input: &[u8]) -> IResult<&[u8], XrefSubsection> {
    let (input, (start, count)) = subsection_header(input)?;
    let (input, entries) = many0(entry)(input)?;
    Ok((
        input,
        XrefSubsection {
            start,
            count,
            entries,
        },
    ))
}

/// Classical table: the keyword `xref`, an end-of-line, then subsections.
pub fn table(input: &[u8]) -> IResult<&[u8], Vec<XrefSubsection>> {
    let (input, _) = keyword(b"xref")(input)?;
    let (input, _) = lexer::eol(input)?;
    many0(subsection)(input)
}

/// The `trailer` keyword and its dictionary, closed by line whitespace and
/// an end-of-line.
pub fn trailer<'a>(parser: &ObjectParser<'a>, input: &'a [u8]) -> IResult<&'a [u8], Dict<'a>> {
    let (input, _) = keyword(b"trailer")(input)?;
    let (input, dict) = parser.dictionary(input)?;
    let (input, _) = lexer::line_whitespace(input)?;
    let (input, _) = lexer::eol(input)?;
    Ok((input, dict))
}

/// A classical cross-reference section: table plus trailer dictionary.
pub fn classical_section<'a>(
    parser: &ObjectParser<'a>,
    input: &'a [u8],
) -> IResult<&'a [u8], XrefSection<'a>> {
    let (input, subsections) = table(input)?;
    let (input, trailer_dict) = trailer(parser, input)?;
    Ok((
        input,
        XrefSection {
            data: XrefData::Table(subsections),
            trailer: trailer_dict,
        },
    ))
}

/// A cross-reference stream section: an indirect stream object whose
/// dictionary declares `/Type /XRef`. The body stays raw; the stream
/// dictionary doubles as the trailer.
pub fn stream_section<'a>(
    parser: &ObjectParser<'a>,
    input: &'a [u8],
) -> IResult<&'a [u8], XrefSection<'a>> {
    let (rest, definition) = parser.indirect_object(input)?;
    match definition.value {
        Object::Stream(stream)
            if stream.dict.get(b"Type").and_then(Object::as_name) == Some(&b"XRef"[..]) =>
        {
            Ok((
                rest,
                XrefSection {
                    data: XrefData::Stream(stream.data),
                    trailer: stream.dict,
                },
            ))
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parse the cross-reference section announced at `offset`, trying the
/// classical form first, then the stream form.
pub fn section_at<'a>(
    parser: &ObjectParser<'a>,
    input: &'a [u8],
    offset: u64,
) -> Option<XrefSection<'a>> {
    let start = usize::try_from(offset).ok()?;
    let slice = input.get(start..)?;
    if let Ok((_, section)) = classical_section(parser, slice) {
        return Some(section);
    }
    stream_section(parser, slice).ok().map(|(_, section)| section)
}

/// The terminal `startxref` marker: the keyword, then the announced byte
/// offset on its own line.
pub fn startxref(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, _) = keyword(b"startxref")(input)?;
    let (input, _) = lexer::line_whitespace(input)?;
    let (input, _) = lexer::eol(input)?;
    let (input, _) = lexer::line_whitespace(input)?;
    let (input, offset) = lexer::digits_u64(input)?;
    let (input, _) = lexer::line_whitespace(input)?;
    let (input, _) = lexer::eol(input)?;
    Ok((input, offset))
}

/// The `%%EOF` marker, followed by an end-of-line or end-of-input.
pub fn eof_marker(input: &[u8]) -> IResult<&[u8], ()> {
    let (input, _) = tag(&b"%%EOF"[..])(input)?;
    let (input, _) = alt((map(lexer::eol, |_| ()), map(eof, |_| ())))(input)?;
    Ok((input, ()))
}

fn terminal_trailer(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, offset) = startxref(input)?;
    let (input, _) = eof_marker(input)?;
    let (input, _) = eof(input)?;
    Ok((input, offset))
}

/// Find the entry offset of the most recent cross-reference section.
///
/// Scans from position `len - 1` downward, attempting to parse
/// "`startxref` ... end-of-input" at each candidate; the first success
/// yields the announced offset.
pub fn find_startxref(input: &[u8]) -> Option<u64> {
    (0..input.len())
        .rev()
        .find_map(|i| terminal_trailer(&input[i..]).ok().map(|(_, offset)| offset))
}

/// Walk the cross-reference chain backwards from the terminal `startxref`.
///
/// Follows `/Prev` links until a trailer has none. The first hop may point
/// anywhere (linearized files reference a later table); every later hop
/// must strictly decrease, which also bounds cyclic chains. Failures are
/// recoverable: the walk stops, keeps what it has, and records a
/// diagnostic.
pub fn walk<'a>(input: &'a [u8], parser: &ObjectParser<'a>) -> XrefWalk<'a> {
    let mut sections = Vec::new();
    let mut warnings = Vec::new();

    let Some(start) = find_startxref(input) else {
        warnings.push(Error::StartxrefNotFound);
        return XrefWalk { sections, warnings };
    };

    let mut offset = start;
    let mut hopped = false;
    loop {
        log::debug!("parsing xref section at offset {}", offset);
        let Some(section) = section_at(parser, input, offset) else {
            warnings.push(Error::XrefSection { offset });
            break;
        };

        let prev = match section.trailer.get(b"Prev") {
            None => None,
            Some(Object::Integer(n)) if *n >= 0 => Some(Ok(*n as u64)),
            Some(_) => Some(Err(())),
        };
        sections.push(section);

        match prev {
            None => break,
            Some(Err(())) => {
                warnings.push(Error::PrevNotInteger);
                break;
            }
            Some(Ok(next)) => {
                if hopped && next >= offset {
                    warnings.push(Error::PrevPointsForward { offset });
                    break;
                }
                offset = next;
                hopped = true;
            }
        }
    }

    XrefWalk { sections, warnings }
}

/// Merged object-number index over the sections of a completed walk.
///
/// Sections are visited in walk order (newest first) and the first entry
/// seen for an object number wins, so later revisions shadow earlier
/// ones. Only classical table entries contribute; raw stream bodies are
/// not decoded.
#[derive(Debug, Default)]
pub struct XrefIndex {
    entries: IndexMap<u32, XrefEntry>,
}

impl XrefIndex {
    /// Build the index from walked sections.
    pub fn from_sections(sections: &[XrefSection<'_>]) -> Self {
        let mut entries = IndexMap::new();
        for section in sections {
            let XrefData::Table(subsections) = &section.data else {
                continue;
            };
            for subsection in subsections {
                for (i, entry) in subsection.entries.iter().enumerate() {
                    let Ok(number) = u32::try_from(subsection.start + i as u64) else {
                        continue;
                    };
                    entries.entry(number).or_insert(*entry);
                }
            }
        }
        Self { entries }
    }

    /// Entry for an object number, if any section covered it.
    pub fn get(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries.get(&object_number)
    }

    /// Iterate entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XrefEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of distinct object numbers indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for XrefSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            XrefData::Table(subsections) => {
                writeln!(f, "xref")?;
                for subsection in subsections {
                    writeln!(f, "{} {}", subsection.start, subsection.count)?;
                    for entry in &subsection.entries {
                        let kind = if entry.is_in_use() { 'n' } else { 'f' };
                        writeln!(f, "{:010} {:05} {}", entry.offset, entry.generation, kind)?;
                    }
                }
            }
            XrefData::Stream(body) => {
                writeln!(f, "xref stream ({} bytes)", body.len())?;
            }
        }
        write!(f, "trailer {}", self.trailer)
    }
}
