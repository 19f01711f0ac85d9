//! Render engine: canonical letter → TEI pseudo-XML text.
//!
//! Rendering is a pure function of the document and a [`RenderContext`].
//! Roles (opener, dateline, body paragraph, postscript) are assigned in a
//! separate step ([`roles`]) and element layout lives in [`layout`], so this
//! module only decides which element every node becomes.
//!
//! ## Output Shape
//!
//! ```text
//! <?xml …?>  two <?xml-model …?>  <!--encoded body of letter …-->
//! <TEI>
//!   <teiHeader> title / publication / source </teiHeader>
//!   <text><body><div type="letter">
//!     <pb n="1" />  children…  <closer> at its index
//!   </div></body></text>
//! </TEI>
//! ```

pub mod layout;
pub mod roles;

use crate::document::{Block, Closer, FootnoteRef, Highlight, Inline, LetterDocument, Paragraph, Run};
use chrono::NaiveDate;
use layout::{Fragment, InlineText, Layout, Tag};
use roles::{assign_roles, nested_role, Role};
use tracing::warn;

const SCHEMA_HREF: &str = "https://gams.uni-graz.at/o:hsa.odd/RNG";
const TEI_NAMESPACE: &str = r#"xmlns="http://www.tei-c.org/ns/1.0""#;
const LETTER_DIV: &str = r#"type="letter" subtype="original" xml:lang="de""#;
const NAME_REF: &str = r##"ref="#""##;
const UNKNOWN_RENDITION: &str = r##"rendition="#none" rend="unknown""##;

/// Values stamped into the output that do not come from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Editor initials for the header comment.
    pub editor: String,
    /// Last-edit date for the header comment.
    pub date: NaiveDate,
    /// Spaces per nesting level.
    pub indent: usize,
}

/// `d.m.yyyy`, without zero padding.
pub fn format_edit_date(date: NaiveDate) -> String {
    date.format("%-d.%-m.%Y").to_string()
}

/// Render a whole letter to TEI text, terminated by a newline.
pub fn render_document(doc: &LetterDocument, ctx: &RenderContext) -> String {
    let renderer = Renderer {
        layout: Layout::new(ctx.indent),
    };

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        format!(
            r#"<?xml-model href="{SCHEMA_HREF}" type="application/xml" schematypens="http://relaxng.org/ns/structure/1.0"?>"#
        ),
        format!(
            r#"<?xml-model href="{SCHEMA_HREF}" type="application/xml" schematypens="http://purl.oclc.org/dsdl/schematron"?>"#
        ),
        format!(
            "<!--encoded body of letter {}_, {}, last edit {}-->",
            doc.doc_number.map(|n| n.to_string()).unwrap_or_default(),
            ctx.editor,
            format_edit_date(ctx.date)
        ),
    ];
    lines.extend(renderer.tei(doc).into_lines());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

struct Renderer {
    layout: Layout,
}

impl Renderer {
    fn el(&self, tag: Tag<'_>, children: Vec<Fragment>) -> Fragment {
        self.layout.element(tag, children)
    }

    fn tei(&self, doc: &LetterDocument) -> Fragment {
        let source: Vec<Fragment> = doc.source.as_deref().map(text).into_iter().collect();
        let header = self.el(
            Tag::new("teiHeader"),
            vec![self.el(
                Tag::new("fileDesc"),
                vec![
                    self.el(
                        Tag::new("titleStmt"),
                        vec![self.el(Tag::new("title"), vec![text("Title")])],
                    ),
                    self.el(
                        Tag::new("publicationStmt"),
                        vec![self.el(Tag::new("p"), vec![text("Publication Information")])],
                    ),
                    self.el(
                        Tag::new("sourceDesc"),
                        vec![self.el(Tag::new("p"), source)],
                    ),
                ],
            )],
        );

        let div = self.el(Tag::new("div").attrs(LETTER_DIV), self.body(doc));
        let body = self.el(
            Tag::new("text"),
            vec![self.el(Tag::new("body"), vec![div])],
        );

        self.el(Tag::new("TEI").attrs(TEI_NAMESPACE), vec![header, body])
    }

    /// Page break, the children in role order, and the closer spliced in at
    /// its index (or appended when the index is past the end).
    fn body(&self, doc: &LetterDocument) -> Vec<Fragment> {
        let roles = assign_roles(&doc.children);
        let closer_at = doc.closer.as_ref().map(|c| c.index);

        let mut out = vec![self.el(Tag::new("pb").attrs(r#"n="1""#), vec![])];
        for (index, (block, role)) in doc.children.iter().zip(roles).enumerate() {
            if closer_at == Some(index) {
                out.extend(doc.closer.as_ref().map(|c| self.closer(c)));
            }
            out.extend(self.block(block, role));
        }
        if closer_at.is_some_and(|i| i >= doc.children.len()) {
            out.extend(doc.closer.as_ref().map(|c| self.closer(c)));
        }
        out
    }

    fn block(&self, block: &Block, role: Role) -> Option<Fragment> {
        match block {
            Block::Paragraph(p) => Some(self.paragraph(p, role)),
            Block::Postscript(ps) => {
                let children = ps
                    .children
                    .iter()
                    .filter_map(|b| self.block(b, nested_role(b)))
                    .collect();
                Some(self.el(Tag::new("postscript").force_multi(), children))
            }
            Block::Unsupported { kind } => {
                warn!("Unsupported block node {:?}; skipping", kind);
                None
            }
        }
    }

    fn paragraph(&self, p: &Paragraph, role: Role) -> Fragment {
        let tag = match role {
            Role::Opener => Tag::new("opener"),
            Role::Dateline => Tag::new("dateline"),
            _ => Tag::new("p").force_multi(),
        };
        let runs = p.runs.iter().map(|r| self.run(r)).collect();
        self.el(tag, runs)
    }

    fn closer(&self, closer: &Closer) -> Fragment {
        let mut children = Vec::with_capacity(3);
        if let Some(salute) = &closer.salute {
            children.push(self.el(Tag::new("salute"), vec![text(salute)]));
        }
        if closer.salute.is_some() && closer.signed.is_some() {
            children.push(self.el(Tag::new("lb"), vec![]));
        }
        if let Some(signed) = &closer.signed {
            children.push(self.el(Tag::new("signed"), vec![text(signed)]));
        }
        self.el(Tag::new("closer"), children)
    }

    fn run(&self, run: &Run) -> Fragment {
        let Some(highlight) = run.highlight else {
            return self.plain_or_italic(run);
        };
        // A highlighted lone footnote marker is just the footnote.
        if let Some(note) = run.sole_footnote() {
            return self.footnote(note);
        }
        let tag = match highlight {
            Highlight::Green => Tag::new("persName"),
            Highlight::Red => Tag::new("todo"),
            Highlight::Cyan => Tag::new("placeName"),
            other => {
                warn!("Unhandled highlight {:?}; rendering run unwrapped", other);
                return self.plain_or_italic(run);
            }
        };
        self.el(tag.attrs(NAME_REF).inline(), self.inlines(&run.children))
    }

    fn plain_or_italic(&self, run: &Run) -> Fragment {
        let children = self.inlines(&run.children);
        if run.italic && run.has_text() {
            return self.el(Tag::new("hi").attrs(UNKNOWN_RENDITION).inline(), children);
        }
        Fragment::Inline(InlineText::join(children.into_iter().map(Fragment::into_inline)))
    }

    fn inlines(&self, inlines: &[Inline]) -> Vec<Fragment> {
        inlines.iter().filter_map(|i| self.inline(i)).collect()
    }

    fn inline(&self, inline: &Inline) -> Option<Fragment> {
        match inline {
            Inline::Text(value) => Some(text(value)),
            Inline::FootnoteRef(note) => Some(self.footnote(note)),
            Inline::Unsupported { kind } => {
                warn!("Unsupported inline node {:?}; skipping", kind);
                None
            }
        }
    }

    /// The note sits exactly where the marker was; spacing around it comes
    /// from the neighbouring text, not from the note body.
    fn footnote(&self, note: &FootnoteRef) -> Fragment {
        let attrs = format!(r#"type="editorial" place="foot" n="{}""#, note.number);
        let body = note.body.iter().map(|r| self.run(r)).collect();
        let rendered = self.el(Tag::new("note").attrs(&attrs).inline(), body);
        Fragment::Inline(InlineText::markup(rendered.into_inline().text))
    }
}

fn text(value: &str) -> Fragment {
    Fragment::Inline(InlineText::leaf(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alignment, Postscript};
    use std::sync::Arc;

    fn ctx(indent: usize) -> RenderContext {
        RenderContext {
            editor: "HS".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            indent,
        }
    }

    fn para(alignment: Alignment, runs: Vec<Run>) -> Block {
        Block::Paragraph(Paragraph::new(alignment, runs))
    }

    fn normal(text: &str) -> Block {
        para(Alignment::Normal, vec![Run::plain(text)])
    }

    fn right(text: &str) -> Block {
        para(Alignment::Right, vec![Run::plain(text)])
    }

    fn styled(highlight: Option<Highlight>, italic: bool, children: Vec<Inline>) -> Run {
        Run {
            highlight,
            italic,
            children,
        }
    }

    fn note(number: u32, body: &str) -> FootnoteRef {
        FootnoteRef {
            number,
            body: Arc::new(vec![Run::plain(body)]),
        }
    }

    /// Trimmed, non-empty output lines.
    fn trimmed(xml: &str) -> Vec<&str> {
        xml.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn full_document_layout() {
        let doc = LetterDocument {
            children: vec![right("Graz"), normal("Lieber Freund,"), normal("Text")],
            doc_number: Some(12),
            source: Some("Schuchardt --> Paris".into()),
            closer: Some(Closer {
                index: 3,
                salute: Some("Grüsse".into()),
                signed: Some("Hugo".into()),
            }),
        };
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-model href="https://gams.uni-graz.at/o:hsa.odd/RNG" type="application/xml" schematypens="http://relaxng.org/ns/structure/1.0"?>
<?xml-model href="https://gams.uni-graz.at/o:hsa.odd/RNG" type="application/xml" schematypens="http://purl.oclc.org/dsdl/schematron"?>
<!--encoded body of letter 12_, HS, last edit 18.10.2026-->
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Title</title></titleStmt>
      <publicationStmt><p>Publication Information</p></publicationStmt>
      <sourceDesc><p>Schuchardt --> Paris</p></sourceDesc>
    </fileDesc>
  </teiHeader>
  <text>
    <body>
      <div type="letter" subtype="original" xml:lang="de">
        <pb n="1" />
        <dateline>Graz</dateline>
        <opener>Lieber Freund,</opener>
        <p>
          Text
        </p>
        <closer>
          <salute>Grüsse</salute>
          <lb />
          <signed>Hugo</signed>
        </closer>
      </div>
    </body>
  </text>
</TEI>
"#;
        assert_eq!(render_document(&doc, &ctx(2)), expected);
    }

    #[test]
    fn missing_metadata_renders_empty_slots() {
        let xml = render_document(&LetterDocument::default(), &ctx(2));
        assert!(xml.contains("<!--encoded body of letter _, HS, last edit 18.10.2026-->"));
        assert!(xml.contains("<sourceDesc><p /></sourceDesc>"));
        assert!(!xml.contains("<closer"));
    }

    #[test]
    fn edit_date_has_no_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_edit_date(date), "5.3.2024");
    }

    #[test]
    fn closer_is_spliced_before_its_index() {
        let doc = LetterDocument {
            children: vec![
                normal("Lieber Freund,"),
                normal("Text"),
                Block::Postscript(Postscript {
                    children: vec![normal("P.S. bald"), right("Wien")],
                }),
            ],
            closer: Some(Closer {
                index: 2,
                salute: None,
                signed: Some("Hugo".into()),
            }),
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(2));
        let lines = trimmed(&xml);
        let start = lines
            .iter()
            .position(|l| *l == "<closer><signed>Hugo</signed></closer>")
            .unwrap();
        assert_eq!(
            &lines[start..start + 8],
            &[
                "<closer><signed>Hugo</signed></closer>",
                "<postscript>",
                "<p>",
                "P.S. bald",
                "</p>",
                "<dateline>Wien</dateline>",
                "</postscript>",
                "</div>",
            ]
        );
        assert!(!xml.contains("<lb />"));
    }

    #[test]
    fn indent_width_is_configurable() {
        let doc = LetterDocument {
            children: vec![normal("a")],
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(4));
        assert!(xml.contains("\n    <teiHeader>\n"));
        assert!(xml.contains("\n                <pb n=\"1\" />\n"));
    }

    #[test]
    fn highlights_become_inline_names() {
        let doc = LetterDocument {
            children: vec![
                normal("Lieber Freund,"),
                para(
                    Alignment::Normal,
                    vec![
                        Run::plain("Brief von "),
                        styled(Some(Highlight::Green), false, vec![Inline::Text("Hugo Schuchardt".into())]),
                        Run::plain(" aus "),
                        styled(Some(Highlight::Cyan), false, vec![Inline::Text("Graz".into())]),
                        Run::plain(", "),
                        styled(Some(Highlight::Red), false, vec![Inline::Text("unklar".into())]),
                        styled(Some(Highlight::Yellow), false, vec![Inline::Text(" gelb".into())]),
                    ],
                ),
            ],
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(2));
        assert!(trimmed(&xml).contains(
            &r##"Brief von <persName ref="#">Hugo Schuchardt</persName> aus <placeName ref="#">Graz</placeName>, <todo ref="#">unklar</todo> gelb"##
        ));
    }

    #[test]
    fn italic_text_gets_hi_but_blank_italic_does_not() {
        let doc = LetterDocument {
            children: vec![
                normal("Lieber Freund,"),
                para(
                    Alignment::Normal,
                    vec![
                        Run::plain("in der "),
                        styled(None, true, vec![Inline::Text("Romania".into())]),
                        styled(None, true, vec![Inline::Text(" ".into())]),
                        Run::plain("gelesen"),
                    ],
                ),
            ],
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(2));
        assert!(trimmed(&xml)
            .contains(&r##"in der <hi rendition="#none" rend="unknown">Romania</hi> gelesen"##));
    }

    #[test]
    fn highlighted_footnote_renders_note_only() {
        let doc = LetterDocument {
            children: vec![
                normal("Lieber Freund,"),
                para(
                    Alignment::Normal,
                    vec![
                        Run::plain("Ihr Aufsatz "),
                        styled(
                            Some(Highlight::Green),
                            false,
                            vec![Inline::FootnoteRef(note(1, " Romania IX."))],
                        ),
                        Run::plain("."),
                    ],
                ),
            ],
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(2));
        assert!(trimmed(&xml).contains(
            &r#"Ihr Aufsatz <note type="editorial" place="foot" n="1">Romania IX.</note>."#
        ));
        assert!(!xml.contains("persName"));
    }

    #[test]
    fn every_reference_gets_its_own_note() {
        let shared = note(2, "Revue critique");
        let doc = LetterDocument {
            children: vec![
                normal("Lieber Freund,"),
                para(
                    Alignment::Normal,
                    vec![Run {
                        children: vec![
                            Inline::Text("erstens".into()),
                            Inline::FootnoteRef(shared.clone()),
                            Inline::Text(" zweitens".into()),
                            Inline::FootnoteRef(shared),
                        ],
                        ..Run::default()
                    }],
                ),
            ],
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(2));
        assert_eq!(xml.matches(r#"n="2">Revue critique</note>"#).count(), 2);
    }

    #[test]
    fn unsupported_nodes_render_nothing() {
        let doc = LetterDocument {
            children: vec![
                Block::Unsupported {
                    kind: "table".into(),
                },
                normal("Text"),
                para(
                    Alignment::Normal,
                    vec![Run {
                        children: vec![
                            Inline::Text("vor".into()),
                            Inline::Unsupported {
                                kind: "drawing".into(),
                            },
                            Inline::Text(" nach".into()),
                        ],
                        ..Run::default()
                    }],
                ),
            ],
            ..LetterDocument::default()
        };
        let xml = render_document(&doc, &ctx(2));
        let lines = trimmed(&xml);
        // The table took the opener slot, so "Text" is a body paragraph.
        assert!(!xml.contains("<opener>"));
        assert!(lines.contains(&"Text"));
        assert!(lines.contains(&"vor nach"));
        assert!(!xml.contains("table"));
    }
}
