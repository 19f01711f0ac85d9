//! Pass 3: detect the closer (salutation and signature) among the
//! right-aligned paragraphs near the end of the letter.
//!
//! The first three children are never considered; they hold the place/date
//! line and the opener, which are right-aligned just as often.
//!
//! Only the unambiguous shapes are acted on. One right-aligned paragraph that
//! reads as exactly one of salute/signature, or two that read as one of each,
//! are lifted out. Every other shape is reported and left in place.

use super::emit;
use crate::document::{Closer, LetterDocument};
use crate::error::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;

/// Paragraphs before this index are never closer candidates.
const FIRST_CANDIDATE: usize = 3;

static RE_SALUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)grüss|gruess|herzlich").unwrap());
static RE_SIGNED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hugo|schuchardt|gaston|paris").unwrap());

pub fn is_salute(text: &str) -> bool {
    RE_SALUTE.is_match(text)
}

pub fn is_signed(text: &str) -> bool {
    RE_SIGNED.is_match(text)
}

pub fn detect_closer(doc: LetterDocument, diagnostics: &mut Vec<Diagnostic>) -> LetterDocument {
    let candidates: Vec<usize> = doc
        .children
        .iter()
        .enumerate()
        .filter(|&(i, block)| i >= FIRST_CANDIDATE && block.is_right_aligned())
        .map(|(i, _)| i)
        .collect();

    let text_at = |i: usize| doc.children[i].text();

    let found = match candidates.as_slice() {
        [] => {
            emit(diagnostics, Diagnostic::CloserMissing);
            None
        }
        &[index] => {
            let text = text_at(index);
            let closer = match (is_salute(&text), is_signed(&text)) {
                (true, false) => Some(Closer {
                    index,
                    salute: Some(text.trim().to_string()),
                    signed: None,
                }),
                (false, true) => Some(Closer {
                    index,
                    salute: None,
                    signed: Some(text.trim().to_string()),
                }),
                _ => {
                    emit(diagnostics, Diagnostic::CloserUnrecognized { index, text });
                    None
                }
            };
            closer.map(|c| (c, vec![index]))
        }
        &[first, second] => {
            let (a, b) = (text_at(first), text_at(second));
            let pair = if is_salute(&a) && is_signed(&b) {
                Some((a, b))
            } else if is_salute(&b) && is_signed(&a) {
                Some((b, a))
            } else {
                emit(
                    diagnostics,
                    Diagnostic::CloserPairUnrecognized { first, second },
                );
                None
            };
            pair.map(|(salute, signed)| {
                let closer = Closer {
                    index: first,
                    salute: Some(salute.trim().to_string()),
                    signed: Some(signed.trim().to_string()),
                };
                (closer, vec![first, second])
            })
        }
        many => {
            emit(
                diagnostics,
                Diagnostic::CloserAmbiguous { count: many.len() },
            );
            None
        }
    };

    let Some((closer, lifted)) = found else {
        return doc;
    };

    let children = doc
        .children
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !lifted.contains(i))
        .map(|(_, block)| block)
        .collect();

    LetterDocument {
        children,
        closer: Some(closer),
        ..doc
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn body() -> Vec<crate::document::Block> {
        vec![right("Graz, 1.1.1880"), normal("Lieber Freund,"), normal("Text.")]
    }

    #[test]
    fn keyword_sets() {
        assert!(is_salute("Herzliche Grüsse"));
        assert!(is_salute("mit besten GRUESSEN"));
        assert!(!is_salute("Hugo Schuchardt"));
        assert!(is_signed("Gaston Paris"));
        assert!(is_signed("H. SCHUCHARDT"));
        assert!(!is_signed("Ihr ergebener"));
    }

    #[test]
    fn salute_then_signature() {
        let mut children = body();
        children.extend([normal("Mehr."), normal("Ende."), right("Grüsse"), right("Hugo Schuchardt")]);
        let mut diags = Vec::new();
        let out = detect_closer(doc(children), &mut diags);
        assert!(diags.is_empty());
        assert_eq!(
            out.closer,
            Some(Closer {
                index: 5,
                salute: Some("Grüsse".into()),
                signed: Some("Hugo Schuchardt".into()),
            })
        );
        assert_eq!(out.children.len(), 5);
    }

    #[test]
    fn signature_then_salute_is_assigned_by_meaning() {
        let mut children = body();
        children.extend([right("Gaston Paris "), normal("Zwischen"), right(" Herzlich")]);
        let mut diags = Vec::new();
        let out = detect_closer(doc(children), &mut diags);
        assert_eq!(
            out.closer,
            Some(Closer {
                index: 3,
                salute: Some("Herzlich".into()),
                signed: Some("Gaston Paris".into()),
            })
        );
        assert_eq!(texts(&out)[3], "Zwischen");
    }

    #[test]
    fn single_salute_or_signature() {
        let mut children = body();
        children.push(right("Ihr Hugo"));
        let mut diags = Vec::new();
        let out = detect_closer(doc(children), &mut diags);
        assert_eq!(
            out.closer,
            Some(Closer {
                index: 3,
                salute: None,
                signed: Some("Ihr Hugo".into()),
            })
        );
        assert_eq!(out.children.len(), 3);
    }

    #[test]
    fn single_unrecognised_or_mixed_is_left_alone() {
        for text in ["Wien", "Grüsse von Hugo"] {
            let mut children = body();
            children.push(right(text));
            let input = doc(children);
            let mut diags = Vec::new();
            let out = detect_closer(input.clone(), &mut diags);
            assert_eq!(out, input);
            assert!(matches!(diags[0], Diagnostic::CloserUnrecognized { index: 3, .. }));
        }
    }

    #[test]
    fn inconsistent_pair_is_left_alone() {
        let mut children = body();
        children.extend([right("Grüsse"), right("Herzlichst")]);
        let input = doc(children);
        let mut diags = Vec::new();
        let out = detect_closer(input.clone(), &mut diags);
        assert_eq!(out, input);
        assert_eq!(
            diags,
            vec![Diagnostic::CloserPairUnrecognized { first: 3, second: 4 }]
        );
    }

    #[test]
    fn early_right_aligned_paragraphs_are_ignored() {
        let input = doc(body());
        let mut diags = Vec::new();
        let out = detect_closer(input.clone(), &mut diags);
        assert_eq!(out, input);
        assert_eq!(diags, vec![Diagnostic::CloserMissing]);
    }

    #[test]
    fn more_than_two_candidates_is_ambiguous() {
        let mut children = body();
        children.extend([right("Grüsse"), right("Hugo"), right("Schuchardt")]);
        let input = doc(children);
        let mut diags = Vec::new();
        let out = detect_closer(input.clone(), &mut diags);
        assert_eq!(out, input);
        assert_eq!(diags, vec![Diagnostic::CloserAmbiguous { count: 3 }]);
    }
}
