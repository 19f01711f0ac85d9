//! Pass 2: collect footnote definitions and link the `[n]` markers to them.
//!
//! Transcribers type footnotes as ordinary paragraphs at the end of the
//! letter: a first run holding just `[n]`, then the note text. Inside the body
//! the same `[n]` appears in running text. This pass removes the definition
//! paragraphs and replaces every marker with a [`FootnoteRef`] that shares
//! the note body.
//!
//! The backward scan stops at the first right-aligned paragraph. That encodes
//! an assumption about the transcriptions, not a general rule: footnotes are
//! always placed after the closer lines, so anything above a right-aligned
//! paragraph is letter text even if it happens to start with `[n]`.

use super::emit;
use crate::document::{footnote_marker, Block, FootnoteRef, Inline, LetterDocument, Postscript, Run};
use crate::error::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

static RE_DEFINITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[(\d+)\]\s*$").unwrap());
static RE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

/// Footnote number → shared note body.
pub type Footnotes = BTreeMap<u32, Arc<Vec<Run>>>;

pub fn extract_footnotes(doc: LetterDocument, diagnostics: &mut Vec<Diagnostic>) -> LetterDocument {
    let definitions = find_definitions(&doc.children, diagnostics);

    let mut footnotes = Footnotes::new();
    let mut body = Vec::with_capacity(doc.children.len());
    for (index, block) in doc.children.into_iter().enumerate() {
        match (definitions.get(&index), block) {
            (Some(&number), Block::Paragraph(p)) => {
                let note: Vec<Run> = p.runs.into_iter().skip(1).collect();
                footnotes.insert(number, Arc::new(note));
            }
            (_, block) => body.push(block),
        }
    }

    let children = if footnotes.is_empty() {
        body
    } else {
        body.into_iter()
            .map(|block| link_block(block, &footnotes))
            .collect()
    };

    LetterDocument { children, ..doc }
}

/// Index → footnote number of every definition paragraph to lift out.
fn find_definitions(children: &[Block], diagnostics: &mut Vec<Diagnostic>) -> BTreeMap<usize, u32> {
    let mut by_index = BTreeMap::new();
    let mut seen = BTreeMap::new();

    for (index, block) in children.iter().enumerate().rev() {
        let Block::Paragraph(p) = block else {
            continue;
        };
        if block.is_right_aligned() {
            break;
        }
        if p.runs.len() < 2 {
            continue;
        }
        let Some(number) = definition_number(&p.runs[0]) else {
            continue;
        };
        if seen.insert(number, index).is_some() {
            emit(diagnostics, Diagnostic::DuplicateFootnote { number });
            continue;
        }
        by_index.insert(index, number);
    }
    by_index
}

fn definition_number(run: &Run) -> Option<u32> {
    RE_DEFINITION
        .captures(&run.text())
        .and_then(|caps| caps[1].parse().ok())
}

fn link_block(block: Block, footnotes: &Footnotes) -> Block {
    match block {
        Block::Paragraph(mut p) => {
            p.runs = p.runs.into_iter().map(|r| link_run(r, footnotes)).collect();
            Block::Paragraph(p)
        }
        Block::Postscript(ps) => Block::Postscript(Postscript {
            children: ps
                .children
                .into_iter()
                .map(|b| link_block(b, footnotes))
                .collect(),
        }),
        other => other,
    }
}

fn link_run(mut run: Run, footnotes: &Footnotes) -> Run {
    run.children = run
        .children
        .into_iter()
        .flat_map(|inline| match inline {
            Inline::Text(text) => split_markers(text, footnotes),
            other => vec![other],
        })
        .collect();
    run
}

/// Split a text leaf around every marker of a known footnote, dropping empty
/// pieces. Markers of unknown numbers stay plain text.
pub fn split_markers(text: String, footnotes: &Footnotes) -> Vec<Inline> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in RE_MARKER.captures_iter(&text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some((number, body)) = caps[1]
            .parse::<u32>()
            .ok()
            .filter(|n| footnote_marker(*n) == whole.as_str())
            .and_then(|n| footnotes.get(&n).map(|body| (n, body)))
        else {
            continue;
        };

        if whole.start() > last {
            pieces.push(Inline::Text(text[last..whole.start()].to_string()));
        }
        pieces.push(Inline::FootnoteRef(FootnoteRef {
            number,
            body: Arc::clone(body),
        }));
        last = whole.end();
    }

    if pieces.is_empty() {
        return vec![Inline::Text(text)];
    }
    if last < text.len() {
        pieces.push(Inline::Text(text[last..].to_string()));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::document::{Alignment, Highlight, Paragraph};

    fn definition(number: u32, note: &str) -> Block {
        runs(
            Alignment::Normal,
            vec![Run::plain(format!("[{number}]")), Run::plain(note)],
        )
    }

    fn refs(block: &Block) -> Vec<&FootnoteRef> {
        let Block::Paragraph(p) = block else {
            return Vec::new();
        };
        p.runs
            .iter()
            .flat_map(|r| r.children.iter())
            .filter_map(|i| match i {
                Inline::FootnoteRef(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn definitions_are_removed_and_markers_linked() {
        let mut diags = Vec::new();
        let out = extract_footnotes(
            doc(vec![
                normal("Ihr Aufsatz[1] über Paris[2]."),
                right("Hugo"),
                definition(1, " Romania IX."),
                definition(2, " Revue critique."),
            ]),
            &mut diags,
        );
        assert!(diags.is_empty());
        assert_eq!(out.children.len(), 2);

        let Block::Paragraph(p) = &out.children[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            p.runs[0].children.iter().map(Inline::text).collect::<Vec<_>>(),
            vec!["Ihr Aufsatz", "[1]", " über Paris", "[2]", "."]
        );
        let linked = refs(&out.children[0]);
        assert_eq!(linked[0].body.as_slice(), &[Run::plain(" Romania IX.")]);
        assert_eq!(linked[1].number, 2);
    }

    #[test]
    fn repeated_references_share_one_body() {
        let mut diags = Vec::new();
        let out = extract_footnotes(
            doc(vec![
                normal("erstens [3]"),
                normal("[3] zweitens [3]"),
                definition(3, " Note"),
            ]),
            &mut diags,
        );
        let all: Vec<&FootnoteRef> = out.children.iter().flat_map(refs).collect();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| Arc::ptr_eq(&r.body, &all[0].body)));
    }

    #[test]
    fn scan_stops_at_right_aligned_paragraph() {
        let mut diags = Vec::new();
        let input = doc(vec![
            normal("Text [1]"),
            definition(1, " oberhalb"),
            right("Grüsse"),
        ]);
        let out = extract_footnotes(input.clone(), &mut diags);
        assert_eq!(out, input);
    }

    #[test]
    fn duplicate_numbers_keep_the_first_recording() {
        let mut diags = Vec::new();
        let out = extract_footnotes(
            doc(vec![
                normal("Text [1]"),
                definition(1, " early"),
                definition(1, " late"),
            ]),
            &mut diags,
        );
        assert_eq!(diags, vec![Diagnostic::DuplicateFootnote { number: 1 }]);
        // The later paragraph was recorded first (backward scan); the earlier
        // duplicate stays in place.
        assert_eq!(out.children.len(), 2);
        assert_eq!(out.children[1].text(), "[1] early");
        assert_eq!(refs(&out.children[0])[0].body.as_slice(), &[Run::plain(" late")]);
    }

    #[test]
    fn single_run_paragraph_is_not_a_definition() {
        let mut diags = Vec::new();
        let input = doc(vec![normal("Text [1]"), normal("[1]")]);
        let out = extract_footnotes(input.clone(), &mut diags);
        assert_eq!(out, input);
    }

    #[test]
    fn unknown_and_padded_markers_stay_text() {
        let mut footnotes = Footnotes::new();
        footnotes.insert(1, Arc::new(vec![Run::plain("n")]));
        assert_eq!(
            split_markers("[2] and [01]".into(), &footnotes),
            vec![Inline::Text("[2] and [01]".into())]
        );
        let pieces = split_markers("[1]".into(), &footnotes);
        assert_eq!(pieces.len(), 1);
        assert!(matches!(pieces[0], Inline::FootnoteRef(_)));
    }

    #[test]
    fn highlighted_marker_run_keeps_its_style() {
        let mut diags = Vec::new();
        let marker_run = highlighted(Highlight::Green, "[4]");
        let out = extract_footnotes(
            doc(vec![
                Block::Paragraph(Paragraph::new(
                    Alignment::Normal,
                    vec![Run::plain("Text"), marker_run],
                )),
                definition(4, " Note"),
            ]),
            &mut diags,
        );
        let Block::Paragraph(p) = &out.children[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.runs[1].highlight, Some(Highlight::Green));
        assert!(p.runs[1].sole_footnote().is_some());
    }
}
