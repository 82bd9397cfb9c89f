//! File-structure scenarios: headers, revisions, cross-reference walking,
//! and the debug assembler's diagnostics.

use pdf_ast::error::Error;
use pdf_ast::xref::{self, XrefData};
use pdf_ast::{parse_document, Arena, Object, ObjectParser};

/// Build a file of chained single-entry revisions. `prevs[i]` names the
/// revision whose xref offset revision `i`'s trailer `/Prev` points at.
/// Returns the bytes and each revision's xref offset.
///
/// Offsets are rendered zero-padded to a fixed width so the layout does
/// not depend on their values; a first pass with dummy offsets computes
/// the layout, a second pass fills in the real ones.
fn build_revisions(prevs: &[Option<usize>]) -> (Vec<u8>, Vec<u64>) {
    let build = |offsets: &[u64]| -> (Vec<u8>, Vec<u64>) {
        let mut pdf = Vec::new();
        let mut xref_offsets = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        for (i, prev) in prevs.iter().enumerate() {
            pdf.extend_from_slice(format!("{} 0 obj null endobj\n", i + 1).as_bytes());
            xref_offsets.push(pdf.len() as u64);
            pdf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
            match prev {
                Some(j) => pdf.extend_from_slice(
                    format!(
                        "trailer << /Size 1 /Prev {:010} >>\n",
                        offsets.get(*j).copied().unwrap_or(0)
                    )
                    .as_bytes(),
                ),
                None => pdf.extend_from_slice(b"trailer << /Size 1 >>\n"),
            }
            pdf.extend_from_slice(format!("startxref\n{:010}\n%%EOF\n", xref_offsets[i]).as_bytes());
        }
        (pdf, xref_offsets)
    };

    let (_, offsets) = build(&vec![0; prevs.len()]);
    build(&offsets)
}

#[test]
fn minimal_file_with_classical_xref() {
    let input: &[u8] = b"%PDF-1.4\n1 0 obj null endobj\nxref\n0 1\n0000000000 65535 f\r\ntrailer <</Size 1>>\nstartxref\n9\n%%EOF\n";
    let arena = Arena::new();
    let document = parse_document(input, &arena).expect("should parse");

    assert_eq!(document.revisions.len(), 1);
    let revision = &document.revisions[0];
    assert_eq!(revision.body.len(), 1);
    assert_eq!(revision.body[0].value, Object::Null);

    let section = revision.xref.as_ref().expect("xref section present");
    assert_eq!(
        section.trailer.get(b"Size").and_then(Object::as_integer),
        Some(1)
    );
    match &section.data {
        XrefData::Table(subsections) => {
            assert_eq!(subsections.len(), 1);
            assert_eq!(subsections[0].entries.len(), 1);
            assert!(!subsections[0].entries[0].is_in_use());
        }
        XrefData::Stream(_) => panic!("expected a classical table"),
    }
    assert_eq!(revision.startxref, 9);
}

#[test]
fn two_revisions_walk_both_sections() {
    let (pdf, offsets) = build_revisions(&[None, Some(0)]);
    let arena = Arena::new();

    // the strict assembler sees two revisions
    let document = parse_document(&pdf, &arena).expect("should parse");
    assert_eq!(document.revisions.len(), 2);

    // the walker follows /Prev back to the first section
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(&pdf, &parser);
    assert!(walk.warnings.is_empty(), "warnings: {:?}", walk.warnings);
    assert_eq!(walk.sections.len(), 2);
    assert_eq!(xref::find_startxref(&pdf), Some(offsets[1]));
}

#[test]
fn prev_to_unparsable_offset_keeps_one_section() {
    // the second trailer's /Prev points past the end of the file
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n1 0 obj null endobj\n");
    let x = pdf.len() as u64;
    pdf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
    pdf.extend_from_slice(b"trailer << /Size 1 /Prev 9999999 >>\n");
    pdf.extend_from_slice(format!("startxref\n{}\n%%EOF\n", x).as_bytes());

    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(&pdf, &parser);
    assert_eq!(walk.sections.len(), 1);
    assert_eq!(walk.warnings.len(), 1);
    assert!(matches!(walk.warnings[0], Error::XrefSection { offset: 9999999 }));
}

#[test]
fn forward_prev_past_first_hop_stops_with_diagnostic() {
    // chain: startxref -> rev 2, whose /Prev -> rev 1, whose /Prev points
    // forward again at rev 2. The second hop violates the
    // strictly-decreasing rule.
    let (pdf, offsets) = build_revisions(&[None, Some(2), Some(1)]);
    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(&pdf, &parser);

    assert_eq!(walk.sections.len(), 2);
    assert_eq!(walk.warnings.len(), 1);
    assert!(
        matches!(walk.warnings[0], Error::PrevPointsForward { offset } if offset == offsets[1])
    );
}

#[test]
fn first_hop_may_point_forward() {
    // linearized layout: the terminal startxref enters at the *early*
    // section, whose /Prev references a later one. The forward first hop
    // is allowed.
    let build = |xa: u64, xb: u64| -> (Vec<u8>, u64, u64) {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n1 0 obj null endobj\n");
        let a = pdf.len() as u64;
        pdf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        pdf.extend_from_slice(format!("trailer << /Size 1 /Prev {:010} >>\n", xb).as_bytes());
        pdf.extend_from_slice(format!("startxref\n{:010}\n%%EOF\n", xa).as_bytes());
        pdf.extend_from_slice(b"2 0 obj null endobj\n");
        let b = pdf.len() as u64;
        pdf.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        pdf.extend_from_slice(b"trailer << /Size 1 >>\n");
        pdf.extend_from_slice(format!("startxref\n{:010}\n%%EOF\n", xa).as_bytes());
        (pdf, a, b)
    };
    let (_, a, b) = build(0, 0);
    let (pdf, xa, xb) = build(a, b);
    assert_eq!((xa, xb), (a, b));
    assert!(xb > xa, "layout should place the /Prev target later");

    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(&pdf, &parser);
    assert!(walk.warnings.is_empty(), "warnings: {:?}", walk.warnings);
    assert_eq!(walk.sections.len(), 2);
}

#[test]
fn missing_startxref_yields_empty_walk() {
    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(b"%PDF-1.4\n1 0 obj null endobj\n", &parser);
    assert!(walk.sections.is_empty());
    assert_eq!(walk.warnings.len(), 1);
    assert!(matches!(walk.warnings[0], Error::StartxrefNotFound));
}

#[test]
fn xref_stream_section_normalizes_like_a_table() {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.5\n");
    let x = pdf.len() as u64;
    pdf.extend_from_slice(
        b"7 0 obj << /Type /XRef /Length 4 >>\nstream\nDATA\nendstream endobj\n",
    );
    pdf.extend_from_slice(format!("startxref\n{}\n%%EOF\n", x).as_bytes());

    let arena = Arena::new();

    // the document assembler sees the xref stream as an ordinary body
    // object
    let document = parse_document(&pdf, &arena).expect("should parse");
    assert_eq!(document.revisions[0].body.len(), 1);
    assert!(document.revisions[0].xref.is_none());

    // the walker normalizes it to a section with the stream dictionary as
    // trailer
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(&pdf, &parser);
    assert!(walk.warnings.is_empty());
    assert_eq!(walk.sections.len(), 1);
    assert_eq!(walk.sections[0].data, XrefData::Stream(&b"DATA"[..]));
    assert_eq!(
        walk.sections[0].trailer.get(b"Type").and_then(Object::as_name),
        Some(&b"XRef"[..])
    );
}

#[test]
fn startxref_pointing_at_non_section_warns() {
    let input: &[u8] = b"%PDF-1.4\n1 0 obj null endobj\nxref\n0 1\n0000000000 65535 f\r\ntrailer <</Size 1>>\nstartxref\n9\n%%EOF\n";
    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    // offset 9 is the first object definition, not a cross-reference
    // section
    let walk = xref::walk(input, &parser);
    assert!(walk.sections.is_empty());
    assert!(matches!(walk.warnings[0], Error::XrefSection { offset: 9 }));
}

#[test]
fn debug_assembler_reports_furthest_position() {
    let input: &[u8] = b"%PDF-1.4\n1 0 obj null endobj\n2 0 obj <<";
    let arena = Arena::new();
    let err = parse_document(input, &arena).unwrap_err();
    let expected = b"%PDF-1.4\n1 0 obj null endobj".len() as u64;
    assert!(matches!(err, Error::ErrorAfter { offset } if offset == expected));
}

#[test]
fn garbage_input_is_no_parse() {
    let arena = Arena::new();
    let err = parse_document(b"garbage", &arena).unwrap_err();
    assert!(matches!(err, Error::NoParse));
}

#[test]
fn xref_index_merges_revisions_newest_first() {
    let (pdf, _) = build_revisions(&[None, Some(0)]);
    let arena = Arena::new();
    let parser = ObjectParser::new(&arena);
    let walk = xref::walk(&pdf, &parser);
    let index = xref::XrefIndex::from_sections(&walk.sections);
    // both revisions cover object 0; the newer (walked first) wins
    assert_eq!(index.len(), 1);
    assert!(!index.get(0).unwrap().is_in_use());
}
