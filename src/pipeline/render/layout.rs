//! Tag layout: how an element and its rendered children become text.
//!
//! Rendering produces [`Fragment`]s. Inline fragments flow together on one
//! line (runs, highlights, footnotes inside running prose); block fragments
//! are lists of lines that the parent indents one level.
//!
//! Element layout (unless the element is inline):
//!
//! | children | layout |
//! |----------|--------|
//! | none | `<tag />` |
//! | one, fitting on a single line | `<tag>child</tag>` |
//! | otherwise, or forced multi-line | open line, indented content, close line |
//!
//! Inline elements always stay on one line, whatever their child count.

use quick_xml::escape::minimal_escape;

/// Inline text plus whether whitespace surrounded it in the source, so
/// neighbouring pieces can be rejoined with a single space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineText {
    pub text: String,
    pub space_before: bool,
    pub space_after: bool,
}

impl InlineText {
    /// A text leaf: trimmed, with its surrounding whitespace remembered.
    pub fn leaf(raw: &str) -> Self {
        let trimmed = raw.trim();
        let all_space = trimmed.is_empty() && !raw.is_empty();
        Self {
            text: escape_text(trimmed),
            space_before: all_space || raw.starts_with(char::is_whitespace),
            space_after: all_space || raw.ends_with(char::is_whitespace),
        }
    }

    /// Markup that is already escaped.
    pub fn markup(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Concatenate pieces, inserting one space wherever the source had
    /// whitespace at the boundary.
    pub fn join(pieces: impl IntoIterator<Item = InlineText>) -> Self {
        let mut out = InlineText::default();
        let mut started = false;
        let mut pending = false;

        for piece in pieces {
            if piece.text.is_empty() {
                let spaced = piece.space_before || piece.space_after;
                if started {
                    pending |= spaced;
                } else {
                    out.space_before |= spaced;
                }
                continue;
            }
            if !started {
                out.space_before |= piece.space_before;
                started = true;
            } else if pending || piece.space_before {
                out.text.push(' ');
            }
            out.text.push_str(&piece.text);
            pending = piece.space_after;
        }

        // Whitespace-only input is spacing on both sides.
        out.space_after = pending || (!started && out.space_before);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Inline(InlineText),
    Block(Vec<String>),
}

impl Fragment {
    /// The fragment as a single line, if it fits on one.
    fn single_line(&self) -> Option<&str> {
        match self {
            Fragment::Inline(t) => Some(&t.text),
            Fragment::Block(lines) if lines.len() == 1 => Some(&lines[0]),
            Fragment::Block(_) => None,
        }
    }

    /// Flatten into inline text; block lines are joined with spaces.
    pub fn into_inline(self) -> InlineText {
        match self {
            Fragment::Inline(t) => t,
            Fragment::Block(lines) => InlineText::markup(lines.join(" ")),
        }
    }

    pub fn into_lines(self) -> Vec<String> {
        match self {
            Fragment::Inline(t) if t.text.is_empty() => Vec::new(),
            Fragment::Inline(t) => vec![t.text],
            Fragment::Block(lines) => lines,
        }
    }
}

/// An element about to be laid out.
#[derive(Debug, Clone, Copy)]
pub struct Tag<'a> {
    name: &'a str,
    attrs: &'a str,
    force_multi: bool,
    inline: bool,
}

impl<'a> Tag<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            attrs: "",
            force_multi: false,
            inline: false,
        }
    }

    pub fn attrs(mut self, attrs: &'a str) -> Self {
        self.attrs = attrs;
        self
    }

    /// Always use open line / content / close line, even for one child.
    pub fn force_multi(mut self) -> Self {
        self.force_multi = true;
        self
    }

    /// Keep the element on one line inside running prose.
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    fn open(&self) -> String {
        if self.attrs.is_empty() {
            format!("<{}>", self.name)
        } else {
            format!("<{} {}>", self.name, self.attrs)
        }
    }

    fn close(&self) -> String {
        format!("</{}>", self.name)
    }

    fn self_closing(&self) -> String {
        if self.attrs.is_empty() {
            format!("<{} />", self.name)
        } else {
            format!("<{} {} />", self.name, self.attrs)
        }
    }
}

/// Lays out elements with a fixed indentation unit.
#[derive(Debug, Clone)]
pub struct Layout {
    indent: String,
}

impl Layout {
    pub fn new(indent_width: usize) -> Self {
        Self {
            indent: " ".repeat(indent_width),
        }
    }

    pub fn element(&self, tag: Tag<'_>, children: Vec<Fragment>) -> Fragment {
        if tag.inline {
            return Fragment::Inline(inline_element(&tag, children));
        }

        if children.is_empty() && !tag.force_multi {
            return Fragment::Block(vec![tag.self_closing()]);
        }

        if !tag.force_multi {
            if let [only] = children.as_slice() {
                if let Some(line) = only.single_line() {
                    return Fragment::Block(vec![format!("{}{}{}", tag.open(), line, tag.close())]);
                }
            }
        }

        let mut lines = vec![tag.open()];
        lines.extend(
            content_lines(children)
                .into_iter()
                .map(|line| format!("{}{}", self.indent, line)),
        );
        lines.push(tag.close());
        Fragment::Block(lines)
    }
}

fn inline_element(tag: &Tag<'_>, children: Vec<Fragment>) -> InlineText {
    if children.is_empty() {
        return InlineText::markup(tag.self_closing());
    }
    let inner = InlineText::join(children.into_iter().map(Fragment::into_inline));
    InlineText {
        text: format!("{}{}{}", tag.open(), inner.text, tag.close()),
        space_before: inner.space_before,
        space_after: inner.space_after,
    }
}

/// Lines of a block element's content: runs of inline fragments share a
/// line, block fragments keep their own lines.
fn content_lines(children: Vec<Fragment>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Vec<InlineText> = Vec::new();

    let flush = |pending: &mut Vec<InlineText>, lines: &mut Vec<String>| {
        if !pending.is_empty() {
            let joined = InlineText::join(pending.drain(..));
            if !joined.text.is_empty() {
                lines.push(joined.text);
            }
        }
    };

    for child in children {
        match child {
            Fragment::Inline(t) => pending.push(t),
            Fragment::Block(block) => {
                flush(&mut pending, &mut lines);
                lines.extend(block);
            }
        }
    }
    flush(&mut pending, &mut lines);
    lines
}

/// Escape the characters that would break XML text content (`&`, `<`).
/// `>` is left alone so `A --> B` reads as typed.
pub fn escape_text(text: &str) -> String {
    minimal_escape(text).into_owned()
}
