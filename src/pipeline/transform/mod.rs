//! Structural transformer: generic paragraph tree → canonical letter.
//!
//! The raw tree is first lowered into the canonical types of
//! [`crate::document`], then rewritten by five heuristic passes. Each pass is
//! a pure function that takes the document by value and returns the rewritten
//! one, so a pass never observes indices shifted by its own deletions.
//!
//! ## Pass Order
//!
//! ```text
//! lower ──▶ source ──▶ footnotes ──▶ closer ──▶ prune ──▶ postscript
//! ```
//!
//! The order matters: the closer heuristics count right-aligned paragraphs
//! only after footnote definitions are gone, and postscript grouping relies on
//! the closer index that pruning keeps valid.
//!
//! None of the passes can fail. A heuristic that cannot classify its input
//! leaves that region untouched and records a [`Diagnostic`].

pub mod closer;
pub mod footnotes;
pub mod postscript;
pub mod prune;
pub mod source;

use crate::document::{Alignment, Block, Highlight, Inline, LetterDocument, Paragraph, Run};
use crate::error::Diagnostic;
use crate::raw::{RawDocument, RawNode, RawParagraph, RawRun};
use serde::Serialize;
use tracing::{debug, warn};

/// Signature shared by every rewrite pass.
pub type Pass = fn(LetterDocument, &mut Vec<Diagnostic>) -> LetterDocument;

/// The rewrite passes, in the order they must run.
pub const PASSES: [(&str, Pass); 5] = [
    ("source", source::extract_source),
    ("footnotes", footnotes::extract_footnotes),
    ("closer", closer::detect_closer),
    ("prune", prune::prune_empty_paragraphs),
    ("postscript", postscript::group_postscript),
];

/// A canonical letter plus everything the heuristics had to say about it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transformed {
    pub document: LetterDocument,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower `raw` and run every pass over it.
pub fn transform(raw: RawDocument) -> Transformed {
    run_passes(lower(raw))
}

/// Run every pass over an already-lowered document.
pub fn run_passes(mut document: LetterDocument) -> Transformed {
    let mut diagnostics = Vec::new();
    for (name, pass) in PASSES {
        let before = diagnostics.len();
        document = pass(document, &mut diagnostics);
        debug!(
            pass = name,
            children = document.children.len(),
            diagnostics = diagnostics.len() - before,
            "Structural pass complete"
        );
    }
    Transformed {
        document,
        diagnostics,
    }
}

/// Record a non-fatal finding and log it.
pub(crate) fn emit(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    warn!("{}", diagnostic);
    diagnostics.push(diagnostic);
}

// ── Lowering ─────────────────────────────────────────────────────────────

/// Convert the generic tree into canonical types, keeping only the style
/// information the heuristics read (alignment, highlight, italic).
pub fn lower(raw: RawDocument) -> LetterDocument {
    LetterDocument {
        children: raw.children.into_iter().map(lower_block).collect(),
        ..LetterDocument::default()
    }
}

fn lower_block(node: RawNode) -> Block {
    match node {
        RawNode::Paragraph(p) => Block::Paragraph(lower_paragraph(p)),
        RawNode::Other { kind, .. } => Block::Unsupported { kind },
        // Stray inline content at body level gets a paragraph of its own.
        inline @ (RawNode::Run(_) | RawNode::Text { .. }) => Block::Paragraph(Paragraph::new(
            Alignment::Normal,
            lower_paragraph_child(inline),
        )),
    }
}

fn lower_paragraph(p: RawParagraph) -> Paragraph {
    Paragraph {
        alignment: Alignment::from_justification(p.alignment.as_deref()),
        runs: p
            .children
            .into_iter()
            .flat_map(lower_paragraph_child)
            .collect(),
    }
}

fn lower_paragraph_child(node: RawNode) -> Vec<Run> {
    match node {
        RawNode::Run(r) => vec![lower_run(r)],
        RawNode::Text { value } => vec![Run::plain(value)],
        RawNode::Paragraph(p) => p
            .children
            .into_iter()
            .flat_map(lower_paragraph_child)
            .collect(),
        RawNode::Other { kind, .. } => vec![Run {
            children: vec![Inline::Unsupported { kind }],
            ..Run::default()
        }],
    }
}

fn lower_run(r: RawRun) -> Run {
    let highlight = r.style.highlight.as_deref().and_then(|value| {
        let parsed = Highlight::parse(value);
        if parsed.is_none() {
            debug!("Ignoring unknown highlight value {:?}", value);
        }
        parsed
    });
    Run {
        highlight,
        italic: r.style.italic,
        children: r.children.into_iter().flat_map(lower_inline).collect(),
    }
}

fn lower_inline(node: RawNode) -> Vec<Inline> {
    match node {
        RawNode::Text { value } => vec![Inline::Text(value)],
        RawNode::Run(r) => r.children.into_iter().flat_map(lower_inline).collect(),
        RawNode::Paragraph(_) => vec![Inline::Unsupported {
            kind: "paragraph".to_string(),
        }],
        RawNode::Other { kind, .. } => vec![Inline::Unsupported { kind }],
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Builders shared by the pass tests.

    use crate::document::{Alignment, Block, Highlight, Inline, LetterDocument, Paragraph, Run};

    pub fn para(alignment: Alignment, text: &str) -> Block {
        Block::Paragraph(Paragraph::new(alignment, vec![Run::plain(text)]))
    }

    pub fn normal(text: &str) -> Block {
        para(Alignment::Normal, text)
    }

    pub fn right(text: &str) -> Block {
        para(Alignment::Right, text)
    }

    pub fn center(text: &str) -> Block {
        para(Alignment::Center, text)
    }

    pub fn runs(alignment: Alignment, runs: Vec<Run>) -> Block {
        Block::Paragraph(Paragraph::new(alignment, runs))
    }

    pub fn highlighted(color: Highlight, text: &str) -> Run {
        Run {
            highlight: Some(color),
            italic: false,
            children: vec![Inline::Text(text.to_string())],
        }
    }

    pub fn doc(children: Vec<Block>) -> LetterDocument {
        LetterDocument {
            children,
            ..LetterDocument::default()
        }
    }

    pub fn texts(doc: &LetterDocument) -> Vec<String> {
        doc.children.iter().map(Block::text).collect()
    }
}
