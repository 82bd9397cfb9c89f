//! PDF structure dump.
//!
//! Parses one PDF file and pretty-prints the resulting AST to stdout.
//! Cross-reference walk diagnostics and parse failures go to stderr, one
//! per line, as `<path>: <message>`. Exit code 0 on a successful full
//! parse, 1 otherwise.

use pdf_ast::{parse_document, Arena, ObjectParser};

fn main() {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "parse_pdf".to_string());
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("usage: {} file", program);
        std::process::exit(1);
    };

    let input = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            std::process::exit(1);
        }
    };

    let arena = Arena::new();

    // Walk the cross-reference chain first; its failures are recoverable
    // and only surface as diagnostics.
    let parser = ObjectParser::new(&arena);
    let walk = pdf_ast::xref::walk(&input, &parser);
    for warning in &walk.warnings {
        eprintln!("{}: {}", path, warning);
    }

    match parse_document(&input, &arena) {
        Ok(document) => print!("{}", document),
        Err(err) => {
            eprintln!("{}: {}", path, err);
            std::process::exit(1);
        }
    }
}
