//! PDF lexical layer.
//!
//! This module provides the token-level readers the object parser is built
//! from: character classes, end-of-line normalization, whitespace and
//! comment handling, and the readers for numbers, names, and strings.
//!
//! # PDF Lexical Overview
//!
//! - Whitespace: space, tab, CR, LF, NUL, form feed; comments (`%` to end
//!   of line) are whitespace-equivalent everywhere whitespace is allowed.
//! - Numbers: integers (`42`, `-123`, `+17`) and reals (`3.14`, `5.`, `.5`)
//! - Names: `/` followed by name-regular bytes and `#hh` escapes
//! - Strings: literal (`(Hello)`, balanced nesting, C-style escapes) and
//!   hexadecimal (`<48656C6C6F>`)
//!
//! Keyword-like tokens end on a *fence*: the byte after them must not be a
//! regular character, so `nullx` is not the keyword `null` followed by `x`.
//! Tokens that end at an unambiguous delimiter (`[`, `<<`, `(` ...) take
//! leading whitespace but no fence.
//!
//! Every end-of-line (CR, LF, or CRLF) recognized inside a token is
//! normalized to a single LF.

use crate::arena::Arena;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, opt, recognize},
    sequence::pair,
    IResult,
};

/// Whitespace characters (ISO 32000-1, Table 1).
///
/// NUL, tab, form feed, space, CR, LF.
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b'\0' | b'\t' | b'\x0C' | b' ' | b'\r' | b'\n')
}

/// "Line" whitespace: whitespace that may fill a line before its EOL.
///
/// NUL, tab, form feed, space -- whitespace minus CR and LF.
pub fn is_line_whitespace(c: u8) -> bool {
    matches!(c, b'\0' | b'\t' | b'\x0C' | b' ')
}

/// Delimiter characters (ISO 32000-1, Table 2): `( ) < > [ ] { } / %`.
pub fn is_delimiter(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Regular characters: neither whitespace nor delimiter.
pub fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

/// Name-regular characters: regular and not the `#` escape introducer.
pub fn is_name_regular(c: u8) -> bool {
    is_regular(c) && c != b'#'
}

/// Value of an ASCII hex digit, either case.
fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse one end-of-line: CR, LF, or CRLF, normalized to LF.
pub fn eol(input: &[u8]) -> IResult<&[u8], u8> {
    map(alt((tag(&b"\r\n"[..]), tag(&b"\n"[..]), tag(&b"\r"[..]))), |_| b'\n')(input)
}

/// Parse a comment: `%` through the last byte before the end of line.
///
/// The EOL itself is left for the surrounding whitespace to consume, which
/// also covers a comment terminated by end-of-input.
fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    let (input, _) = char('%')(input)?;
    let (input, _) = take_till(|c| c == b'\r' || c == b'\n')(input)?;
    Ok((input, ()))
}

/// Skip any run of whitespace and comments (the `ws` consumer).
///
/// Always succeeds; an empty run is fine.
pub fn whitespace(input: &[u8]) -> IResult<&[u8], ()> {
    let mut remaining = input;

    loop {
        let before = remaining.len();

        if let Ok((rest, _)) = take_while::<_, _, nom::error::Error<&[u8]>>(is_whitespace)(remaining)
        {
            remaining = rest;
        }
        if let Ok((rest, _)) = comment(remaining) {
            remaining = rest;
        }

        if remaining.len() == before {
            break;
        }
    }

    Ok((remaining, ()))
}

/// Skip line whitespace only (the `lws` consumer). Always succeeds.
pub fn line_whitespace(input: &[u8]) -> IResult<&[u8], ()> {
    map(take_while(is_line_whitespace), |_| ())(input)
}

/// The token fence: succeed only if the next byte is not a regular
/// character (or the input is exhausted). Consumes nothing.
fn fence(input: &[u8]) -> IResult<&[u8], ()> {
    match input.first() {
        Some(&c) if is_regular(c) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Not,
        ))),
        _ => Ok((input, ())),
    }
}

/// A keyword-like atom: leading whitespace, the literal, then the fence.
pub fn keyword(kw: &'static [u8]) -> impl Fn(&[u8]) -> IResult<&[u8], ()> {
    move |input| {
        let (input, _) = whitespace(input)?;
        let (input, _) = tag(kw)(input)?;
        let (input, _) = fence(input)?;
        Ok((input, ()))
    }
}

/// A delimiter token: leading whitespace, then the literal. No fence,
/// since delimiters end tokens by themselves.
pub fn delim(d: &'static [u8]) -> impl Fn(&[u8]) -> IResult<&[u8], ()> {
    move |input| {
        let (input, _) = whitespace(input)?;
        let (input, _) = tag(d)(input)?;
        Ok((input, ()))
    }
}

/// Raw digit run as a `u64`. No whitespace handling, no fence; used where
/// the grammar is byte-exact (xref tables, startxref offsets).
pub fn digits_u64(input: &[u8]) -> IResult<&[u8], u64> {
    let (rest, digits) = digit1(input)?;
    match std::str::from_utf8(digits).ok().and_then(|s| s.parse().ok()) {
        Some(n) => Ok((rest, n)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Non-negative integer token: whitespace, digits, fence.
pub fn natural(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, _) = whitespace(input)?;
    let (input, n) = digits_u64(input)?;
    let (input, _) = fence(input)?;
    Ok((input, n))
}

/// Positive integer token: the leading digit must be nonzero.
///
/// Used for object numbers, which start at 1.
pub fn positive_natural(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, _) = whitespace(input)?;
    let (rest, digits) = recognize(pair(one_of("123456789"), digit0))(input)?;
    let (rest, _) = fence(rest)?;
    match std::str::from_utf8(digits).ok().and_then(|s| s.parse().ok()) {
        Some(n) => Ok((rest, n)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Signed integer token: optional `+`/`-`, digits, fence.
pub fn integer(input: &[u8]) -> IResult<&[u8], i64> {
    let (input, _) = whitespace(input)?;
    let (rest, digits) = recognize(pair(opt(one_of("+-")), digit1))(input)?;
    let (rest, _) = fence(rest)?;
    match std::str::from_utf8(digits).ok().and_then(|s| s.parse().ok()) {
        Some(n) => Ok((rest, n)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Real number token; returns the raw matched text, sign included.
///
/// The accepted shapes are `D.D`, `D.`, and `.D` -- at least one side of
/// the period must be non-empty. The caller keeps the text so printing and
/// re-parsing stays byte-exact; see [`crate::object::Real`].
pub fn real(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, _) = whitespace(input)?;
    let (rest, raw) = recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(pair(digit1, char('.')), digit0)),
            recognize(pair(char('.'), digit1)),
        )),
    ))(input)?;
    let (rest, _) = fence(rest)?;
    Ok((rest, raw))
}

/// Name token: `/` followed by name-regular bytes and `#hh` escapes,
/// decoded into the arena.
///
/// A `#` not followed by two hex digits fails the whole name (the `#`
/// would be left as the next byte, and `#` is regular, so the fence
/// rejects it). The empty name `/` is accepted.
pub fn name<'a>(input: &'a [u8], arena: &'a Arena) -> IResult<&'a [u8], &'a [u8]> {
    let (input, _) = whitespace(input)?;
    let (mut rest, _) = tag(&b"/"[..])(input)?;

    let mut bytes = Vec::new();
    loop {
        match rest.first() {
            Some(&c) if is_name_regular(c) => {
                bytes.push(c);
                rest = &rest[1..];
            }
            Some(&b'#') => {
                let (hi, lo) = match (rest.get(1), rest.get(2)) {
                    (Some(&h), Some(&l)) => (hex_value(h), hex_value(l)),
                    _ => (None, None),
                };
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        bytes.push(16 * hi + lo);
                        rest = &rest[3..];
                    }
                    _ => break,
                }
            }
            _ => break,
        }
    }

    let (rest, _) = fence(rest)?;
    Ok((rest, arena.alloc_bytes(&bytes)))
}

/// Literal string token: balanced parentheses, escapes decoded into the
/// arena.
///
/// Escape forms: `\n \r \t \b \f`, `\(` `\)` `\\`, one to three octal
/// digits (greedy, high-order overflow discarded), `\` before an EOL as a
/// line continuation, and `\` before anything else dropping the backslash.
/// Raw EOLs inside the string come out as LF; nested balanced parentheses
/// are kept verbatim.
pub fn literal_string<'a>(input: &'a [u8], arena: &'a Arena) -> IResult<&'a [u8], &'a [u8]> {
    let (input, _) = whitespace(input)?;
    let (rest, _) = tag(&b"("[..])(input)?;

    let mut out = Vec::new();
    let (rest, _) = string_body(rest, &mut out)?;
    let (rest, _) = tag(&b")"[..])(rest)?;
    Ok((rest, arena.alloc_bytes(&out)))
}

/// Decode a literal-string body up to (but not including) the unbalanced
/// closing parenthesis. Nesting is tracked with a counter, so arbitrarily
/// deep strings cannot overflow the stack.
fn string_body<'a>(input: &'a [u8], out: &mut Vec<u8>) -> IResult<&'a [u8], ()> {
    let mut rest = input;
    let mut depth = 0usize;

    loop {
        match rest.first() {
            None => {
                // unbalanced
                return Err(nom::Err::Error(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Eof,
                )));
            }
            Some(b')') if depth == 0 => return Ok((rest, ())),
            Some(b')') => {
                depth -= 1;
                out.push(b')');
                rest = &rest[1..];
            }
            Some(b'(') => {
                depth += 1;
                out.push(b'(');
                rest = &rest[1..];
            }
            Some(b'\r') | Some(b'\n') => {
                let (r, c) = eol(rest)?;
                out.push(c);
                rest = r;
            }
            Some(b'\\') => rest = string_escape(&rest[1..], out)?,
            Some(&c) => {
                out.push(c);
                rest = &rest[1..];
            }
        }
    }
}

/// Decode one escape sequence after the backslash has been consumed.
fn string_escape<'a>(
    input: &'a [u8],
    out: &mut Vec<u8>,
) -> Result<&'a [u8], nom::Err<nom::error::Error<&'a [u8]>>> {
    match input.first() {
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        ))),
        Some(b'n') => {
            out.push(b'\n');
            Ok(&input[1..])
        }
        Some(b'r') => {
            out.push(b'\r');
            Ok(&input[1..])
        }
        Some(b't') => {
            out.push(b'\t');
            Ok(&input[1..])
        }
        Some(b'b') => {
            out.push(0x08);
            Ok(&input[1..])
        }
        Some(b'f') => {
            out.push(0x0C);
            Ok(&input[1..])
        }
        Some(c @ b'0'..=b'7') => {
            // up to three octal digits, greedy; overflow past one byte is
            // discarded
            let mut value = u32::from(c - b'0');
            let mut len = 1;
            while len < 3 {
                match input.get(len) {
                    Some(&d @ b'0'..=b'7') => {
                        value = value * 8 + u32::from(d - b'0');
                        len += 1;
                    }
                    _ => break,
                }
            }
            out.push((value & 0xFF) as u8);
            Ok(&input[len..])
        }
        Some(b'\r') | Some(b'\n') => {
            // line continuation: the escaped EOL vanishes
            let (rest, _) = eol(input)?;
            Ok(rest)
        }
        Some(&c) => {
            // lone backslash: dropped, the next byte is kept verbatim
            out.push(c);
            Ok(&input[1..])
        }
    }
}

/// Hexadecimal string token: `<` hex digits `>`, decoded into the arena.
///
/// Whitespace (and comments) may appear between digits. An odd trailing
/// digit is padded with `0` to form its byte.
pub fn hex_string<'a>(input: &'a [u8], arena: &'a Arena) -> IResult<&'a [u8], &'a [u8]> {
    let (input, _) = whitespace(input)?;
    let (mut rest, _) = tag(&b"<"[..])(input)?;

    let mut nibbles = Vec::new();
    loop {
        let (r, _) = whitespace(rest)?;
        match r.split_first() {
            Some((&c, r2)) => match hex_value(c) {
                Some(v) => {
                    nibbles.push(v);
                    rest = r2;
                }
                None => {
                    rest = r;
                    break;
                }
            },
            None => {
                rest = r;
                break;
            }
        }
    }
    let (rest, _) = tag(&b">"[..])(rest)?;

    let mut bytes = Vec::with_capacity(nibbles.len().div_ceil(2));
    for chunk in nibbles.chunks(2) {
        let hi = chunk[0];
        let lo = chunk.get(1).copied().unwrap_or(0);
        bytes.push(16 * hi + lo);
    }
    Ok((rest, arena.alloc_bytes(&bytes)))
}
