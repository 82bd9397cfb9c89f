//! Object-level parsing scenarios: numbers, names, strings, composites,
//! and streams.

use pdf_ast::{Arena, Object, ObjectParser, ObjectRef};

fn parse_full<'a>(arena: &'a Arena, input: &'a [u8]) -> Object<'a> {
    let parser = ObjectParser::new(arena);
    let (rest, obj) = parser.object(input).expect("object should parse");
    assert!(rest.is_empty(), "unconsumed input: {:?}", rest);
    obj
}

#[test]
fn real_and_reference_and_integers() {
    let arena = Arena::new();

    let obj = parse_full(&arena, b"1.5");
    assert_eq!(obj.as_real(), Some(1.5));

    let obj = parse_full(&arena, b"1 5 R");
    assert_eq!(obj.as_reference(), Some(ObjectRef::new(1, 5)));

    // the same two integers inside an array stay two integers
    let obj = parse_full(&arena, b"[1 5]");
    assert_eq!(
        obj.as_array().unwrap(),
        &[Object::Integer(1), Object::Integer(5)]
    );
}

#[test]
fn literal_string_with_escape_and_nesting() {
    let arena = Arena::new();
    let obj = parse_full(&arena, b"(a\\nb(c)d)");
    assert_eq!(obj.as_string(), Some(&b"a\nb(c)d"[..]));
}

#[test]
fn name_with_hex_escape() {
    let arena = Arena::new();
    let obj = parse_full(&arena, b"/A#20B");
    assert_eq!(obj.as_name(), Some(&b"A B"[..]));
}

#[test]
fn stream_body_is_a_view_of_declared_length() {
    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    let input = b"<< /Length 5 >>\nstream\nHELLO\nendstream";
    let (rest, stream) = parser.stream(input).expect("stream should parse");
    assert!(rest.is_empty());
    assert_eq!(stream.data, b"HELLO");
    // the body borrows from the input rather than copying
    assert_eq!(stream.data.as_ptr(), input[input.len() - 15..].as_ptr());
}

#[test]
fn keyword_fence_rejects_glued_suffix() {
    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    // `nullx` must not parse as the keyword `null` followed by `x`
    let result = parser.object(b"nullx");
    assert!(result.is_err());
}

#[test]
fn dictionary_keeps_order_and_duplicates() {
    let arena = Arena::new();
    let obj = parse_full(&arena, b"<< /B 2 /A 1 /B 3 >>");
    let dict = obj.as_dict().unwrap();
    assert_eq!(dict.len(), 3);
    let keys: Vec<&[u8]> = dict.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![&b"B"[..], &b"A"[..], &b"B"[..]]);
    // first entry wins on lookup
    assert_eq!(dict.get(b"B").and_then(Object::as_integer), Some(2));
}

#[test]
fn deeply_mixed_composite() {
    let arena = Arena::new();
    let obj = parse_full(
        &arena,
        b"<< /Kids [3 0 R <</Leaf true>>] /Count 2 /Label (x\\051) >>",
    );
    let dict = obj.as_dict().unwrap();
    let kids = dict.get(b"Kids").and_then(Object::as_array).unwrap();
    assert_eq!(kids[0].as_reference(), Some(ObjectRef::new(3, 0)));
    assert_eq!(
        kids[1].as_dict().and_then(|d| d.get(b"Leaf")).and_then(Object::as_bool),
        Some(true)
    );
    assert_eq!(dict.get(b"Label").and_then(Object::as_string), Some(&b"x)"[..]));
}

#[test]
fn hex_string_pads_odd_digit() {
    let arena = Arena::new();
    let obj = parse_full(&arena, b"<48 65 6C 6C 6F 2>");
    assert_eq!(obj.as_string(), Some(&b"Hello "[..]));
}

#[test]
fn negative_and_signed_numbers() {
    let arena = Arena::new();
    assert_eq!(parse_full(&arena, b"-123").as_integer(), Some(-123));
    assert_eq!(parse_full(&arena, b"+17").as_integer(), Some(17));
    assert_eq!(parse_full(&arena, b"-.002").as_real(), Some(-0.002));
}
