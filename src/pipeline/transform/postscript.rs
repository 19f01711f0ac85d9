//! Pass 5: everything after the closer becomes the postscript.

use crate::document::{Block, LetterDocument, Postscript};
use crate::error::Diagnostic;

pub fn group_postscript(mut doc: LetterDocument, _diagnostics: &mut Vec<Diagnostic>) -> LetterDocument {
    let Some(index) = doc.closer.as_ref().map(|c| c.index) else {
        return doc;
    };
    // A closer on the last line has nothing after it.
    if index >= doc.children.len() {
        return doc;
    }
    let trailing = doc.children.split_off(index);
    doc.children
        .push(Block::Postscript(Postscript { children: trailing }));
    doc
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::document::Closer;

    fn with_closer(mut d: LetterDocument, index: usize) -> LetterDocument {
        d.closer = Some(Closer {
            index,
            salute: Some("Grüsse".into()),
            signed: Some("Hugo Schuchardt".into()),
        });
        d
    }

    #[test]
    fn trailing_span_becomes_one_postscript() {
        let input = with_closer(
            doc(vec![normal("a"), normal("b"), normal("P.S. 1"), normal("P.S. 2")]),
            2,
        );
        let out = group_postscript(input, &mut Vec::new());
        assert_eq!(out.children.len(), 3);
        assert_eq!(
            out.children[2],
            Block::Postscript(Postscript {
                children: vec![normal("P.S. 1"), normal("P.S. 2")]
            })
        );
    }

    #[test]
    fn no_closer_no_postscript() {
        let input = doc(vec![normal("a"), normal("b")]);
        let out = group_postscript(input.clone(), &mut Vec::new());
        assert_eq!(out, input);
    }

    #[test]
    fn closer_at_end_creates_no_empty_postscript() {
        let input = with_closer(doc(vec![normal("a"), normal("b")]), 2);
        let out = group_postscript(input.clone(), &mut Vec::new());
        assert_eq!(out, input);
    }
}
