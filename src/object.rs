//! PDF object model.
//!
//! The AST produced by a parse. Every token borrows its payload: stream
//! bodies and real-number text are views into the input buffer, decoded
//! name and string bytes live in the parse's [`Arena`](crate::arena::Arena).
//! Tokens are never mutated after a successful parse; the whole AST is
//! freed by dropping the arena.
//!
//! `Display` renders every value in its source syntax, so printing an
//! object and parsing it back yields an equal AST (streams render as a
//! summary instead, since their bodies are arbitrary bytes).

use std::fmt;

use crate::lexer;

/// A parsed PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object<'a> {
    /// Null object, from the keyword `null`
    Null,
    /// Boolean value, from `true` / `false`
    Boolean(bool),
    /// Integer value (sign may have been explicit)
    Integer(i64),
    /// Real (decimal) value; keeps its source text for exact round-trips
    Real(Real<'a>),
    /// String bytes, literal or hex, fully decoded
    String(&'a [u8]),
    /// Name bytes with `#hh` escapes decoded; the slash is not included
    Name(&'a [u8]),
    /// Array of objects
    Array(Vec<Object<'a>>),
    /// Dictionary with insertion order preserved
    Dictionary(Dict<'a>),
    /// Stream: dictionary plus a raw body view into the input
    Stream(Stream<'a>),
    /// Indirect object reference (`n g R`), not a resolved pointer
    Reference(ObjectRef),
}

impl<'a> Object<'a> {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to a real value. Integers are not coerced.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(r.value()),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to name bytes.
    pub fn as_name(&self) -> Option<&'a [u8]> {
        match self {
            Object::Name(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to cast to string bytes.
    pub fn as_string(&self) -> Option<&'a [u8]> {
        match self {
            Object::String(s) => Some(*s),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&[Object<'a>]> {
        match self {
            Object::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both dictionaries and streams.
    pub fn as_dict(&self) -> Option<&Dict<'a>> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&Stream<'a>> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

/// A real number, kept as its raw source text.
///
/// The original text (sign included) is preserved so that printing and
/// re-parsing is idempotent at the byte level; [`Real::value`] computes
/// the numeric value on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Real<'a> {
    raw: &'a [u8],
}

impl<'a> Real<'a> {
    /// Wrap the raw text of a real number as matched by the lexer.
    pub fn new(raw: &'a [u8]) -> Self {
        Self { raw }
    }

    /// The raw source text, sign included.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Numeric value: the integer part is accumulated left to right, the
    /// fractional part right to left with repeated division by ten, then
    /// the sign is applied.
    pub fn value(&self) -> f64 {
        let (sign, digits) = match self.raw.split_first() {
            Some((&b'-', rest)) => (-1.0, rest),
            Some((&b'+', rest)) => (1.0, rest),
            _ => (1.0, self.raw),
        };
        let dot = digits.iter().position(|&b| b == b'.').unwrap_or(digits.len());
        let whole = &digits[..dot];
        let fract = digits.get(dot + 1..).unwrap_or(&[]);

        let mut x = 0.0;
        for &d in whole {
            x = x * 10.0 + f64::from(d - b'0');
        }
        let mut f = 0.0;
        for &d in fract.iter().rev() {
            f = (f + f64::from(d - b'0')) / 10.0;
        }
        sign * (x + f)
    }
}

impl fmt::Display for Real<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.raw))
    }
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number (positive)
    pub id: u32,
    /// Generation number (non-negative)
    pub gen: u32,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u32) -> Self {
        Self { id, gen }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// Dictionary with insertion order preserved and duplicate keys allowed.
///
/// PDF requires dictionary keys to be unique, but real files break the
/// rule; duplicates are kept at parse time and reported with a warning.
/// [`Dict::get`] returns the first entry for a key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict<'a> {
    entries: Vec<(&'a [u8], Object<'a>)>,
}

impl<'a> Dict<'a> {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from parsed entries, warning on duplicate keys.
    pub fn from_entries(entries: Vec<(&'a [u8], Object<'a>)>) -> Self {
        for (i, (key, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(k, _)| k == key) {
                log::warn!(
                    "duplicate dictionary key /{}",
                    String::from_utf8_lossy(key)
                );
            }
        }
        Self { entries }
    }

    /// First value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&Object<'a>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &Object<'a>)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stream object: a dictionary plus the raw body bytes.
///
/// The body is a view into the input buffer, exactly as many bytes as the
/// dictionary's `/Length` declared. No filter decoding is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream<'a> {
    /// The stream dictionary
    pub dict: Dict<'a>,
    /// Raw body bytes, borrowed from the input
    pub data: &'a [u8],
}

/// An indirect object definition: `n g obj ... endobj`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject<'a> {
    /// Identity of the definition
    pub id: ObjectRef,
    /// The wrapped value: any object, or a stream
    pub value: Object<'a>,
}

fn write_name(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("/")?;
    for &b in bytes {
        if lexer::is_name_regular(b) && (0x21..=0x7E).contains(&b) {
            write!(f, "{}", b as char)?;
        } else {
            write!(f, "#{:02X}", b)?;
        }
    }
    Ok(())
}

fn write_literal_string(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("(")?;
    for &b in bytes {
        match b {
            b'\\' => f.write_str("\\\\")?,
            b'(' => f.write_str("\\(")?,
            b')' => f.write_str("\\)")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            0x08 => f.write_str("\\b")?,
            0x0C => f.write_str("\\f")?,
            0x20..=0x7E => write!(f, "{}", b as char)?,
            _ => write!(f, "\\{:03o}", b)?,
        }
    }
    f.write_str(")")
}

impl fmt::Display for Object<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Integer(i) => write!(f, "{}", i),
            Object::Real(r) => write!(f, "{}", r),
            Object::String(s) => write_literal_string(f, s),
            Object::Name(n) => write_name(f, n),
            Object::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Object::Dictionary(d) => write!(f, "{}", d),
            Object::Stream(s) => write!(f, "{}", s),
            Object::Reference(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Display for Dict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<<")?;
        for (key, value) in self.iter() {
            f.write_str(" ")?;
            write_name(f, key)?;
            write!(f, " {}", value)?;
        }
        f.write_str(" >>")
    }
}

impl fmt::Display for Stream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stream({} bytes)", self.dict, self.data.len())
    }
}

impl fmt::Display for IndirectObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} obj\n{}\nendobj", self.id.id, self.id.gen, self.value)
    }
}
