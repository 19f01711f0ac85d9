//! Ingestion: decode `.docx` bytes into the generic [`RawDocument`] tree.
//!
//! A `.docx` file is a zip package; the letter body lives in the
//! `word/document.xml` part as WordprocessingML. The decoder walks that part
//! with a streaming XML reader and keeps a stack of open paragraph/run frames,
//! so memory stays proportional to nesting depth rather than document size.
//!
//! Decoding is CPU-bound and synchronous. Async callers go through
//! [`decode_blocking`], which moves the work onto tokio's blocking pool the
//! same way every other CPU-heavy stage of the pipeline does.

use crate::error::IngestError;
use crate::raw::{RawDocument, RawNode, RawParagraph, RawRun, RunStyle};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

/// Zip local-file-header magic every `.docx` starts with.
pub const DOCX_MAGIC: [u8; 4] = *b"PK\x03\x04";

const MAIN_PART: &str = "word/document.xml";

/// Turns raw document bytes into the generic paragraph tree.
///
/// Implementations must be `Send + Sync`: one decoder is shared by every
/// conversion a [`crate::convert::Converter`] runs.
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, IngestError>;
}

/// Decoder for Office Open XML word-processing packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxDecoder;

impl DocumentDecoder for DocxDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, IngestError> {
        let xml = read_main_part(bytes)?;
        let doc = parse_document_xml(&xml)?;
        debug!("Decoded {} top-level nodes", doc.children.len());
        Ok(doc)
    }
}

/// Run `decoder` on the blocking pool.
pub async fn decode_blocking(
    decoder: Arc<dyn DocumentDecoder>,
    bytes: Arc<[u8]>,
) -> Result<RawDocument, IngestError> {
    tokio::task::spawn_blocking(move || decoder.decode(&bytes))
        .await
        .map_err(|e| IngestError::Task(e.to_string()))?
}

fn read_main_part(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| IngestError::Archive(e.to_string()))?;
    let mut part = archive.by_name(MAIN_PART).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => IngestError::MissingPart(MAIN_PART.to_string()),
        other => IngestError::Archive(other.to_string()),
    })?;
    let mut xml = String::with_capacity(part.size() as usize);
    part.read_to_string(&mut xml)
        .map_err(|e| IngestError::Archive(e.to_string()))?;
    Ok(xml)
}

// ── WordprocessingML walker ──────────────────────────────────────────────

/// An element whose children are still being collected.
enum Frame {
    Paragraph(RawParagraph),
    Run(RawRun),
    Other { kind: String, children: Vec<RawNode> },
}

impl Frame {
    fn children_mut(&mut self) -> &mut Vec<RawNode> {
        match self {
            Frame::Paragraph(p) => &mut p.children,
            Frame::Run(r) => &mut r.children,
            Frame::Other { children, .. } => children,
        }
    }

    fn into_node(self) -> RawNode {
        match self {
            Frame::Paragraph(p) => RawNode::Paragraph(p),
            Frame::Run(r) => RawNode::Run(r),
            Frame::Other { kind, children } => RawNode::Other { kind, children },
        }
    }
}

#[derive(Default)]
struct Walker {
    root: Vec<RawNode>,
    stack: Vec<Frame>,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
}

impl Walker {
    fn attach(&mut self, node: RawNode) {
        match self.stack.last_mut() {
            Some(frame) => frame.children_mut().push(node),
            None => self.root.push(node),
        }
    }

    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            let node = frame.into_node();
            self.attach(node);
        }
    }

    fn current_paragraph(&mut self) -> Option<&mut RawParagraph> {
        match self.stack.last_mut() {
            Some(Frame::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    fn current_run(&mut self) -> Option<&mut RawRun> {
        match self.stack.last_mut() {
            Some(Frame::Run(r)) => Some(r),
            _ => None,
        }
    }

    /// Handle an opening (or self-closing) element. Returns `true` when the
    /// element's subtree should be skipped entirely.
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<bool, IngestError> {
        let local = e.local_name();
        let name = local.as_ref();

        if self.in_paragraph_props {
            match name {
                b"jc" => {
                    if let Some(p) = self.current_paragraph() {
                        p.alignment = attr(e, b"val")?;
                    }
                }
                b"pStyle" => {
                    if let Some(p) = self.current_paragraph() {
                        p.style_id = attr(e, b"val")?;
                    }
                }
                b"pPr" => {}
                // Paragraph-mark run properties and numbering details.
                _ => return Ok(!empty),
            }
            return Ok(false);
        }

        if self.in_run_props {
            let Some(run) = self.current_run() else {
                return Ok(!empty);
            };
            apply_run_property(&mut run.style, name, e)?;
            return Ok(false);
        }

        match name {
            b"p" => {
                self.stack.push(Frame::Paragraph(RawParagraph::default()));
                if empty {
                    self.close();
                }
            }
            b"pPr" if !empty => self.in_paragraph_props = true,
            b"r" => {
                self.stack.push(Frame::Run(RawRun::default()));
                if empty {
                    self.close();
                }
            }
            b"rPr" if !empty => self.in_run_props = true,
            b"t" if !empty => self.in_text = true,
            b"tab" => self.attach(RawNode::text("\t")),
            b"br" | b"cr" => self.attach(RawNode::other("break")),
            b"tbl" => {
                self.stack.push(Frame::Other {
                    kind: "table".to_string(),
                    children: Vec::new(),
                });
                if empty {
                    self.close();
                }
            }
            b"drawing" | b"pict" | b"object" => {
                self.attach(RawNode::other(String::from_utf8_lossy(name)));
                return Ok(!empty);
            }
            b"del" | b"delText" | b"instrText" | b"sectPr" | b"footnoteReference" => {
                return Ok(!empty);
            }
            // Containers whose runs belong to the enclosing paragraph
            // (hyperlink, ins, smartTag, sdt, sdtContent, fldSimple, body, …).
            _ => {}
        }
        Ok(false)
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"pPr" => self.in_paragraph_props = false,
            b"rPr" => self.in_run_props = false,
            b"t" => self.in_text = false,
            b"p" if matches!(self.stack.last(), Some(Frame::Paragraph(_))) => self.close(),
            b"r" if matches!(self.stack.last(), Some(Frame::Run(_))) => self.close(),
            b"tbl" if matches!(self.stack.last(), Some(Frame::Other { .. })) => self.close(),
            _ => {}
        }
    }

    fn text(&mut self, value: &str) {
        if self.in_text && !value.is_empty() {
            self.attach(RawNode::text(value));
        }
    }

    fn finish(mut self) -> RawDocument {
        // Unbalanced input: close whatever is still open.
        while !self.stack.is_empty() {
            self.close();
        }
        RawDocument {
            children: self.root,
        }
    }
}

/// Parse the `word/document.xml` part.
pub fn parse_document_xml(xml: &str) -> Result<RawDocument, IngestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut walker = Walker::default();

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        match event {
            Event::Start(e) => {
                if walker.open(&e, false)? {
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| xml_error(&reader, err))?;
                }
            }
            Event::Empty(e) => {
                walker.open(&e, true)?;
            }
            Event::End(e) => walker.end(e.local_name().as_ref()),
            Event::Text(t) => {
                let value = t.unescape().map_err(|e| xml_error(&reader, e))?;
                walker.text(&value);
            }
            Event::CData(c) => {
                let value = String::from_utf8_lossy(&c.into_inner()).into_owned();
                walker.text(&value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(walker.finish())
}

fn apply_run_property(
    style: &mut RunStyle,
    name: &[u8],
    e: &BytesStart<'_>,
) -> Result<(), IngestError> {
    match name {
        b"b" => style.bold = toggle(e)?,
        b"i" => style.italic = toggle(e)?,
        b"strike" | b"dstrike" => style.strikethrough = toggle(e)?,
        b"caps" => style.all_caps = toggle(e)?,
        b"smallCaps" => style.small_caps = toggle(e)?,
        b"u" => {
            style.underline = !matches!(attr(e, b"val")?.as_deref(), Some("none") | Some("0"));
        }
        b"highlight" => {
            style.highlight = attr(e, b"val")?.filter(|v| v != "none");
        }
        b"rFonts" => {
            style.font = attr(e, b"ascii")?;
        }
        b"sz" => {
            style.font_size = attr(e, b"val")?
                .and_then(|v| v.parse::<f32>().ok())
                .map(|half_points| half_points / 2.0);
        }
        _ => {}
    }
    Ok(())
}

/// OOXML toggle property: present means on unless `w:val` says otherwise.
fn toggle(e: &BytesStart<'_>) -> Result<bool, IngestError> {
    Ok(!matches!(
        attr(e, b"val")?.as_deref(),
        Some("0") | Some("false") | Some("off")
    ))
}

/// Value of the attribute with the given local name (namespace prefix ignored).
fn attr(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, IngestError> {
    for a in e.attributes() {
        let a = a.map_err(|err| IngestError::Xml {
            position: 0,
            detail: err.to_string(),
        })?;
        if a.key.local_name().as_ref() == local {
            let value = a.unescape_value().map_err(|err| IngestError::Xml {
                position: 0,
                detail: err.to_string(),
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn xml_error(reader: &Reader<&[u8]>, e: quick_xml::Error) -> IngestError {
    IngestError::Xml {
        position: reader.buffer_position() as u64,
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn body(inner: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {W}><w:body>{inner}</w:body></w:document>"#)
    }

    fn package(xml: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(MAIN_PART, SimpleFileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn paragraphs(doc: &RawDocument) -> Vec<&RawParagraph> {
        doc.children
            .iter()
            .filter_map(|n| match n {
                RawNode::Paragraph(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_alignment_and_run_styles() {
        let xml = body(
            r#"<w:p><w:pPr><w:jc w:val="center"/><w:rPr><w:b/></w:rPr></w:pPr>
                 <w:r><w:t>12. Schuchardt à Paris</w:t></w:r></w:p>
               <w:p><w:r><w:rPr><w:i/><w:highlight w:val="green"/><w:sz w:val="24"/></w:rPr>
                 <w:t xml:space="preserve">Hugo </w:t></w:r></w:p>"#,
        );
        let doc = parse_document_xml(&xml).unwrap();
        let ps = paragraphs(&doc);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].alignment.as_deref(), Some("center"));

        let RawNode::Run(run) = &ps[1].children[0] else {
            panic!("expected run, got {:?}", ps[1].children[0]);
        };
        assert!(run.style.italic);
        assert!(!run.style.bold, "paragraph-mark bold must not leak into runs");
        assert_eq!(run.style.highlight.as_deref(), Some("green"));
        assert_eq!(run.style.font_size, Some(12.0));
        assert_eq!(run.children, vec![RawNode::text("Hugo ")]);
    }

    #[test]
    fn toggle_off_values() {
        let xml = body(r#"<w:p><w:r><w:rPr><w:i w:val="0"/><w:u w:val="none"/></w:rPr><w:t>x</w:t></w:r></w:p>"#);
        let doc = parse_document_xml(&xml).unwrap();
        let RawNode::Run(run) = &paragraphs(&doc)[0].children[0] else {
            panic!("expected run");
        };
        assert!(!run.style.italic);
        assert!(!run.style.underline);
    }

    #[test]
    fn hyperlink_runs_are_lifted_and_deletions_skipped() {
        let xml = body(
            r#"<w:p><w:hyperlink><w:r><w:t>Graz</w:t></w:r></w:hyperlink>
                 <w:del><w:r><w:delText>weg</w:delText></w:r></w:del>
                 <w:r><w:tab/><w:t>1900</w:t></w:r></w:p>"#,
        );
        let doc = parse_document_xml(&xml).unwrap();
        let p = paragraphs(&doc)[0];
        let runs: Vec<_> = p
            .children
            .iter()
            .filter(|n| matches!(n, RawNode::Run(_)))
            .collect();
        assert_eq!(runs.len(), 2);
        let RawNode::Run(second) = runs[1] else { unreachable!() };
        assert_eq!(second.children, vec![RawNode::text("\t"), RawNode::text("1900")]);
    }

    #[test]
    fn tables_become_other_nodes() {
        let xml = body(r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p/>"#);
        let doc = parse_document_xml(&xml).unwrap();
        assert!(matches!(&doc.children[0], RawNode::Other { kind, .. } if kind == "table"));
        assert!(matches!(&doc.children[1], RawNode::Paragraph(_)));
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = body(r#"<w:p><w:r><w:t>A &amp; B &lt;C&gt;</w:t></w:r></w:p>"#);
        let doc = parse_document_xml(&xml).unwrap();
        let RawNode::Run(run) = &paragraphs(&doc)[0].children[0] else {
            panic!("expected run");
        };
        assert_eq!(run.children, vec![RawNode::text("A & B <C>")]);
    }

    #[test]
    fn decode_full_package() {
        let bytes = package(&body(r#"<w:p><w:r><w:t>Lieber Freund</w:t></w:r></w:p>"#));
        assert_eq!(&bytes[..4], &DOCX_MAGIC);
        let doc = DocxDecoder.decode(&bytes).unwrap();
        assert_eq!(doc.children.len(), 1);
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let err = DocxDecoder.decode(b"%PDF-1.7 not a docx").unwrap_err();
        assert!(matches!(err, IngestError::Archive(_)), "got {err:?}");
    }

    #[test]
    fn rejects_package_without_main_part() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<styles/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = DocxDecoder.decode(&bytes).unwrap_err();
        assert_eq!(err, IngestError::MissingPart(MAIN_PART.to_string()));
    }

    #[test]
    fn rejects_malformed_xml() {
        let err = parse_document_xml("<w:document><w:body><w:p></w:r>").unwrap_err();
        assert!(matches!(err, IngestError::Xml { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn decode_blocking_runs_decoder() {
        let bytes: Arc<[u8]> = package(&body("<w:p/>")).into();
        let doc = decode_blocking(Arc::new(DocxDecoder), bytes).await.unwrap();
        assert_eq!(doc.children.len(), 1);
    }
}
