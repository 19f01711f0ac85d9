//! Pass 1: lift the centered source line (`12. Sender à Recipient`) into
//! [`LetterDocument::doc_number`] and [`LetterDocument::source`].
//!
//! The arrow between sender and recipient arrives as `à`: the transcriptions
//! were typed with a symbol font whose arrow glyph sits on that code point.

use super::emit;
use crate::document::{Alignment, LetterDocument};
use crate::error::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DOC_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\.").unwrap());
static RE_LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());
static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

const SYMBOL_ARROW: char = 'à';
const ARROW: &str = "-->";

pub fn extract_source(mut doc: LetterDocument, diagnostics: &mut Vec<Diagnostic>) -> LetterDocument {
    let centered: Vec<usize> = doc
        .children
        .iter()
        .enumerate()
        .filter(|(_, block)| block.alignment() == Some(Alignment::Center))
        .map(|(i, _)| i)
        .collect();

    match centered.as_slice() {
        [] => emit(diagnostics, Diagnostic::SourceMissing),
        [index] => {
            let block = doc.children.remove(*index);
            let (number, source) = parse_source_line(&block.text());
            if number.is_some() {
                doc.doc_number = number;
            }
            doc.source = Some(source);
        }
        many => emit(
            diagnostics,
            Diagnostic::SourceAmbiguous { count: many.len() },
        ),
    }
    doc
}

/// Split a source line into its letter number and `"A --> B"` text.
pub fn parse_source_line(line: &str) -> (Option<u32>, String) {
    let line = line.replacen(SYMBOL_ARROW, ARROW, 1);
    let number = RE_DOC_NUMBER
        .captures(&line)
        .and_then(|caps| caps[1].parse().ok());
    let line = RE_LEADING_NUMBER.replace(&line, "");
    let line = RE_MARKER.replace(&line, "");
    (number, line.trim().to_string())
}
