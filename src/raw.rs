//! Generic paragraph/run/text tree produced by a [`crate::pipeline::docx::DocumentDecoder`].
//!
//! This is the ingestion contract: a faithful, format-neutral picture of the
//! word-processor body with every style flag the decoder could read. Only a
//! handful of those flags (alignment, highlight, italic) matter to the
//! structural transformer; the rest are carried so other consumers, and
//! debugging output, can see what the source document actually contained.

use serde::{Deserialize, Serialize};

/// Root of the generic tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub children: Vec<RawNode>,
}

/// One node of the generic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawNode {
    Paragraph(RawParagraph),
    Run(RawRun),
    Text { value: String },
    /// Anything the decoder recognised but does not model (tables, breaks, …).
    Other {
        kind: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<RawNode>,
    },
}

impl RawNode {
    pub fn text(value: impl Into<String>) -> Self {
        RawNode::Text {
            value: value.into(),
        }
    }

    pub fn other(kind: impl Into<String>) -> Self {
        RawNode::Other {
            kind: kind.into(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawParagraph {
    /// Raw justification value as written by the word processor
    /// (`"center"`, `"right"`, `"both"`, …). `None` means inherited/left.
    pub alignment: Option<String>,
    pub style_id: Option<String>,
    pub children: Vec<RawNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRun {
    pub style: RunStyle,
    pub children: Vec<RawNode>,
}

/// Character formatting of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    /// Highlight colour name (`"green"`, `"darkRed"`, …).
    pub highlight: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub all_caps: bool,
    pub small_caps: bool,
    pub font: Option<String>,
    /// Font size in points.
    pub font_size: Option<f32>,
}
