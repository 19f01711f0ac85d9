//! Canonical letter model consumed by the render engine.
//!
//! Every node kind is its own type with a fixed field set. The structural
//! transformer ([`crate::pipeline::transform`]) builds this tree from the
//! generic [`crate::raw`] tree; once built it is shared read-only behind an
//! `Arc` and never mutated again.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Root of the canonical tree: one letter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterDocument {
    pub children: Vec<Block>,
    /// Running number of the letter in the edition, taken from the source line.
    pub doc_number: Option<u32>,
    /// `"<sender> --> <recipient>"` source line.
    pub source: Option<String>,
    pub closer: Option<Closer>,
}

/// Salutation and/or signature lifted out of the body.
///
/// `index` is the position in [`LetterDocument::children`] the closer is
/// rendered in front of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closer {
    pub index: usize,
    pub salute: Option<String>,
    pub signed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Postscript(Postscript),
    /// A generic-tree node kind the transformer does not model.
    Unsupported { kind: String },
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Alignment of the block; only paragraphs carry one.
    pub fn alignment(&self) -> Option<Alignment> {
        self.as_paragraph().map(|p| p.alignment)
    }

    pub fn is_right_aligned(&self) -> bool {
        self.alignment() == Some(Alignment::Right)
    }

    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.text(),
            Block::Postscript(ps) => ps.children.iter().map(Block::text).collect(),
            Block::Unsupported { .. } => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Normal,
    Right,
    Center,
}

impl Alignment {
    /// Map a word-processor justification value onto the three alignments
    /// the heuristics distinguish.
    pub fn from_justification(value: Option<&str>) -> Self {
        match value {
            Some("center") => Alignment::Center,
            Some("right") | Some("end") => Alignment::Right,
            _ => Alignment::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub alignment: Alignment,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(alignment: Alignment, runs: Vec<Run>) -> Self {
        Self { alignment, runs }
    }

    /// Concatenated text of every leaf, untrimmed.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    pub fn has_text(&self) -> bool {
        !self.text().trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Postscript {
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub highlight: Option<Highlight>,
    pub italic: bool,
    pub children: Vec<Inline>,
}

impl Run {
    /// An unstyled run holding a single text leaf.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            highlight: None,
            italic: false,
            children: vec![Inline::Text(text.into())],
        }
    }

    pub fn text(&self) -> String {
        self.children.iter().map(Inline::text).collect()
    }

    pub fn has_text(&self) -> bool {
        !self.text().trim().is_empty()
    }

    /// The reference, if the run consists of exactly one footnote reference.
    pub fn sole_footnote(&self) -> Option<&FootnoteRef> {
        match self.children.as_slice() {
            [Inline::FootnoteRef(r)] => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    FootnoteRef(FootnoteRef),
    Unsupported { kind: String },
}

impl Inline {
    pub fn text(&self) -> String {
        match self {
            Inline::Text(s) => s.clone(),
            Inline::FootnoteRef(r) => r.marker(),
            Inline::Unsupported { .. } => String::new(),
        }
    }
}

/// A `[n]` marker in the body text linked to its footnote.
///
/// The body is shared: every reference to the same number points at the same
/// allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteRef {
    pub number: u32,
    pub body: Arc<Vec<Run>>,
}

impl FootnoteRef {
    /// The literal marker text, e.g. `[3]`.
    pub fn marker(&self) -> String {
        footnote_marker(self.number)
    }
}

pub fn footnote_marker(number: u32) -> String {
    format!("[{number}]")
}

/// Word-processor highlight colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    Black,
    Blue,
    Cyan,
    Green,
    Magenta,
    Red,
    Yellow,
    White,
    DarkBlue,
    DarkCyan,
    DarkGreen,
    DarkMagenta,
    DarkRed,
    DarkYellow,
    DarkGray,
    LightGray,
}

impl Highlight {
    /// Parse a highlight value; `"none"` and unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let h = match value {
            "black" => Highlight::Black,
            "blue" => Highlight::Blue,
            "cyan" => Highlight::Cyan,
            "green" => Highlight::Green,
            "magenta" => Highlight::Magenta,
            "red" => Highlight::Red,
            "yellow" => Highlight::Yellow,
            "white" => Highlight::White,
            "darkBlue" => Highlight::DarkBlue,
            "darkCyan" => Highlight::DarkCyan,
            "darkGreen" => Highlight::DarkGreen,
            "darkMagenta" => Highlight::DarkMagenta,
            "darkRed" => Highlight::DarkRed,
            "darkYellow" => Highlight::DarkYellow,
            "darkGray" => Highlight::DarkGray,
            "lightGray" => Highlight::LightGray,
            _ => return None,
        };
        Some(h)
    }
}
