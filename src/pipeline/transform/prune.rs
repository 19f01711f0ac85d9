//! Pass 4: drop paragraphs that contain nothing but whitespace.

use crate::document::{Block, LetterDocument, Postscript};
use crate::error::Diagnostic;

/// Remove every paragraph whose text is empty after trimming.
///
/// A recorded closer index is moved down by the number of top-level blocks
/// removed in front of it, so it still points at the same successor block.
pub fn prune_empty_paragraphs(
    doc: LetterDocument,
    _diagnostics: &mut Vec<Diagnostic>,
) -> LetterDocument {
    let closer_index = doc.closer.as_ref().map(|c| c.index);
    let mut removed_before_closer = 0;

    let children = doc
        .children
        .into_iter()
        .enumerate()
        .filter_map(|(i, block)| {
            let kept = prune_block(block);
            if kept.is_none() && closer_index.is_some_and(|c| i < c) {
                removed_before_closer += 1;
            }
            kept
        })
        .collect();

    let closer = doc.closer.map(|mut c| {
        c.index -= removed_before_closer;
        c
    });

    LetterDocument {
        children,
        closer,
        ..doc
    }
}

fn prune_block(block: Block) -> Option<Block> {
    match block {
        Block::Paragraph(p) if !p.has_text() => None,
        Block::Postscript(ps) => Some(Block::Postscript(Postscript {
            children: ps.children.into_iter().filter_map(prune_block).collect(),
        })),
        other => Some(other),
    }
}
