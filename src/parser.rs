//! PDF object parser.
//!
//! Builds the nine object variants out of the token readers in
//! [`crate::lexer`], including the context-sensitive stream parse and the
//! `n g obj ... endobj` indirect-object wrapper.
//!
//! # Architecture
//!
//! [`ObjectParser`] is a recursive-descent reader: the object nonterminal
//! recurses through arrays and dictionaries by plain method recursion, with
//! a depth guard from [`ParseOptions`]. Alternatives are tried in a fixed
//! order:
//!
//! 1. indirect reference (`n g R`) -- its two leading integers would
//!    otherwise be consumed as separate integers,
//! 2. `null`, `true`, `false`,
//! 3. real before integer -- integers are a prefix of some reals, and the
//!    token fence then separates them,
//! 4. name, string, array, dictionary.
//!
//! # Error Handling
//!
//! Grammar functions return `IResult` from nom; ordered choice backtracks
//! on `Err::Error` and aborts on `Err::Failure` (used for the nesting
//! limit).

use crate::arena::Arena;
use crate::lexer::{self, delim, keyword};
use crate::object::{Dict, IndirectObject, Object, ObjectRef, Real, Stream};
use crate::parser_config::ParseOptions;
use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    combinator::{map, opt, value},
    multi::many0,
    sequence::pair,
    IResult,
};

/// Convert a parsed natural to `u32`, failing the current branch on
/// overflow.
fn narrow(input: &[u8], n: u64) -> Result<u32, nom::Err<nom::error::Error<&[u8]>>> {
    u32::try_from(n).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::TooLarge))
    })
}

/// Recursive-descent reader for PDF objects over a borrowed input buffer.
///
/// The parser itself is cheap to construct and read-only during parsing;
/// decoded payloads go to the [`Arena`] it was built with.
pub struct ObjectParser<'a> {
    arena: &'a Arena,
    options: ParseOptions,
}

impl<'a> ObjectParser<'a> {
    /// Create a parser with default (strict) options.
    pub fn new(arena: &'a Arena) -> Self {
        Self::with_options(arena, ParseOptions::default())
    }

    /// Create a parser with explicit options.
    pub fn with_options(arena: &'a Arena, options: ParseOptions) -> Self {
        Self { arena, options }
    }

    /// The options this parser was built with.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse any object.
    pub fn object(&self, input: &'a [u8]) -> IResult<&'a [u8], Object<'a>> {
        self.object_at_depth(input, 0)
    }

    fn object_at_depth(&self, input: &'a [u8], depth: usize) -> IResult<&'a [u8], Object<'a>> {
        if depth > self.options.max_nesting {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::TooLarge,
            )));
        }
        alt((
            map(|i| self.reference(i), Object::Reference),
            value(Object::Null, keyword(b"null")),
            value(Object::Boolean(true), keyword(b"true")),
            value(Object::Boolean(false), keyword(b"false")),
            map(lexer::real, |raw| Object::Real(Real::new(raw))),
            map(lexer::integer, Object::Integer),
            map(|i| lexer::name(i, self.arena), Object::Name),
            map(|i| self.string(i), Object::String),
            map(|i| self.array(i, depth), Object::Array),
            map(|i| self.dictionary_at_depth(i, depth), Object::Dictionary),
        ))(input)
    }

    /// Parse an indirect reference: `n g R`.
    pub fn reference(&self, input: &'a [u8]) -> IResult<&'a [u8], ObjectRef> {
        let (rest, id) = lexer::positive_natural(input)?;
        let (rest, gen) = lexer::natural(rest)?;
        let (rest, _) = keyword(b"R")(rest)?;
        let id = narrow(input, id)?;
        let gen = narrow(input, gen)?;
        Ok((rest, ObjectRef::new(id, gen)))
    }

    /// Parse a string, literal or hexadecimal.
    pub fn string(&self, input: &'a [u8]) -> IResult<&'a [u8], &'a [u8]> {
        alt((
            |i| lexer::literal_string(i, self.arena),
            |i| lexer::hex_string(i, self.arena),
        ))(input)
    }

    fn array(&self, input: &'a [u8], depth: usize) -> IResult<&'a [u8], Vec<Object<'a>>> {
        let (input, _) = delim(b"[")(input)?;
        let (input, items) = many0(|i| self.object_at_depth(i, depth + 1))(input)?;
        let (input, _) = delim(b"]")(input)?;
        Ok((input, items))
    }

    /// Parse a dictionary: `<<` (name object)* `>>`.
    pub fn dictionary(&self, input: &'a [u8]) -> IResult<&'a [u8], Dict<'a>> {
        self.dictionary_at_depth(input, 0)
    }

    fn dictionary_at_depth(&self, input: &'a [u8], depth: usize) -> IResult<&'a [u8], Dict<'a>> {
        let (input, _) = delim(b"<<")(input)?;
        let (input, entries) = many0(pair(
            |i| lexer::name(i, self.arena),
            |i| self.object_at_depth(i, depth + 1),
        ))(input)?;
        let (input, _) = delim(b">>")(input)?;
        Ok((input, Dict::from_entries(entries)))
    }

    /// Parse a stream object in three steps.
    ///
    /// Head: dictionary, the keyword `stream`, an optional CR and a
    /// mandatory LF. Body: exactly as many bytes as the dictionary's
    /// `/Length` says, returned as a view into the input. Tail: an
    /// optional EOL and the keyword `endstream`.
    ///
    /// The whole stream fails if `/Length` is absent, not an integer, or
    /// negative. An indirect `/Length` is not resolved here; the caller's
    /// ordered choice falls back to parsing the dictionary as a plain
    /// object.
    pub fn stream(&self, input: &'a [u8]) -> IResult<&'a [u8], Stream<'a>> {
        let (input, dict) = self.dictionary(input)?;
        let (input, _) = keyword(b"stream")(input)?;

        let input = if let Some(rest) = input.strip_prefix(b"\r\n") {
            rest
        } else if let Some(rest) = input.strip_prefix(b"\n") {
            rest
        } else if self.options.allow_bare_cr_after_stream {
            match input.strip_prefix(b"\r") {
                Some(rest) => {
                    log::warn!("stream keyword followed by bare CR; accepting in lenient mode");
                    rest
                }
                None => {
                    return Err(nom::Err::Error(nom::error::Error::new(
                        input,
                        nom::error::ErrorKind::Tag,
                    )))
                }
            }
        } else {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )));
        };

        let length = match dict.get(b"Length").and_then(Object::as_integer) {
            Some(n) if n >= 0 => n as usize,
            _ => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )))
            }
        };

        let (input, data) = take(length)(input)?;
        let (input, _) = opt(lexer::eol)(input)?;
        let (input, _) = tag(&b"endstream"[..])(input)?;
        Ok((input, Stream { dict, data }))
    }

    /// Parse an indirect object definition: `n g obj (stream | object)
    /// endobj`. The stream alternative is tried first.
    pub fn indirect_object(&self, input: &'a [u8]) -> IResult<&'a [u8], IndirectObject<'a>> {
        let (rest, id) = lexer::positive_natural(input)?;
        let (rest, gen) = lexer::natural(rest)?;
        let (rest, _) = keyword(b"obj")(rest)?;
        let (rest, value) = alt((
            map(|i| self.stream(i), Object::Stream),
            |i| self.object(i),
        ))(rest)?;
        let (rest, _) = keyword(b"endobj")(rest)?;
        let id = narrow(input, id)?;
        let gen = narrow(input, gen)?;
        Ok((
            rest,
            IndirectObject {
                id: ObjectRef::new(id, gen),
                value,
            },
        ))
    }

    /// Parse a body: zero or more indirect object definitions.
    pub fn body(&self, input: &'a [u8]) -> IResult<&'a [u8], Vec<IndirectObject<'a>>> {
        many0(|i| self.indirect_object(i))(input)
    }
}
