//! Result types returned by the conversion entry points.

use crate::document::{Block, Closer, Inline, LetterDocument};
use crate::error::Diagnostic;
use crate::pipeline::input::display_name;
use crate::pipeline::transform::Transformed;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One converted letter.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Cache key: canonical path, URL, or the identity given to
    /// [`crate::Converter::convert_bytes`].
    pub identity: String,
    /// Short file name, used for display and output file names.
    pub name: String,
    /// The rendered TEI text.
    pub xml: String,
    /// Canonical document and its diagnostics, shared with the cache.
    pub transformed: Arc<Transformed>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    pub fn document(&self) -> &LetterDocument {
        &self.transformed.document
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.transformed.diagnostics
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Paragraphs in the canonical document, postscript included.
    pub paragraphs: usize,
    /// Distinct footnotes referenced from the body.
    pub footnotes: usize,
    /// Footnote references, i.e. `note` elements in the output.
    pub footnote_references: usize,
    pub diagnostics: usize,
    /// The document came from the cache without ingestion.
    pub cached: bool,
    pub load_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What the structural transformer found, without any rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub identity: String,
    pub name: String,
    pub doc_number: Option<u32>,
    pub source: Option<String>,
    pub closer: Option<Closer>,
    pub paragraphs: usize,
    pub footnotes: usize,
    pub footnote_references: usize,
    pub has_postscript: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentSummary {
    pub fn new(identity: impl Into<String>, transformed: &Transformed) -> Self {
        let identity = identity.into();
        let doc = &transformed.document;
        let counts = Counts::of(doc);
        Self {
            name: display_name(&identity),
            identity,
            doc_number: doc.doc_number,
            source: doc.source.clone(),
            closer: doc.closer.clone(),
            paragraphs: counts.paragraphs,
            footnotes: counts.footnotes.len(),
            footnote_references: counts.references,
            has_postscript: doc
                .children
                .iter()
                .any(|b| matches!(b, Block::Postscript(_))),
            diagnostics: transformed.diagnostics.clone(),
        }
    }
}

/// Tallies over a canonical document.
#[derive(Debug, Default)]
pub(crate) struct Counts {
    pub paragraphs: usize,
    pub footnotes: BTreeSet<u32>,
    pub references: usize,
}

impl Counts {
    pub fn of(doc: &LetterDocument) -> Self {
        let mut counts = Counts::default();
        counts.visit(&doc.children);
        counts
    }

    fn visit(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Paragraph(p) => {
                    self.paragraphs += 1;
                    for inline in p.runs.iter().flat_map(|r| r.children.iter()) {
                        if let Inline::FootnoteRef(r) = inline {
                            self.references += 1;
                            self.footnotes.insert(r.number);
                        }
                    }
                }
                Block::Postscript(ps) => self.visit(&ps.children),
                Block::Unsupported { .. } => {}
            }
        }
    }

    pub fn stats(&self, diagnostics: usize) -> ConversionStats {
        ConversionStats {
            paragraphs: self.paragraphs,
            footnotes: self.footnotes.len(),
            footnote_references: self.references,
            diagnostics,
            ..ConversionStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alignment, FootnoteRef, Paragraph, Postscript, Run};

    #[test]
    fn summary_counts_nested_paragraphs_and_references() {
        let note = FootnoteRef {
            number: 1,
            body: Arc::new(vec![Run::plain("Note")]),
        };
        let with_ref = Run {
            children: vec![
                Inline::Text("a".into()),
                Inline::FootnoteRef(note.clone()),
                Inline::FootnoteRef(note),
            ],
            ..Run::default()
        };
        let transformed = Transformed {
            document: LetterDocument {
                children: vec![
                    Block::Paragraph(Paragraph::new(Alignment::Normal, vec![with_ref])),
                    Block::Postscript(Postscript {
                        children: vec![Block::Paragraph(Paragraph::new(
                            Alignment::Normal,
                            vec![Run::plain("P.S.")],
                        ))],
                    }),
                ],
                doc_number: Some(7),
                ..LetterDocument::default()
            },
            diagnostics: vec![Diagnostic::SourceMissing],
        };

        let summary = DocumentSummary::new("/letters/b.docx", &transformed);
        assert_eq!(summary.name, "b.docx");
        assert_eq!(summary.paragraphs, 2);
        assert_eq!(summary.footnotes, 1);
        assert_eq!(summary.footnote_references, 2);
        assert!(summary.has_postscript);
        assert_eq!(summary.doc_number, Some(7));
        assert_eq!(summary.diagnostics, vec![Diagnostic::SourceMissing]);
    }
}
