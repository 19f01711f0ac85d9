//! Role annotation: which TEI element each block renders as.
//!
//! Roles are computed up front so the renderer never needs mutable state
//! while it walks the tree.

use crate::document::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Opener,
    Dateline,
    Paragraph,
    Postscript,
    Unsupported,
}

/// Roles for the top-level children, in order.
///
/// Right-aligned paragraphs are datelines. The first child that is not
/// right-aligned is the opener, unless it is a postscript, which takes the
/// slot without becoming an opener. Everything else is a body paragraph.
pub fn assign_roles(children: &[Block]) -> Vec<Role> {
    let mut opener_open = true;
    children
        .iter()
        .map(|block| {
            if block.is_right_aligned() {
                return Role::Dateline;
            }
            let first = std::mem::replace(&mut opener_open, false);
            match block {
                Block::Paragraph(_) if first => Role::Opener,
                Block::Paragraph(_) => Role::Paragraph,
                Block::Postscript(_) => Role::Postscript,
                Block::Unsupported { .. } => Role::Unsupported,
            }
        })
        .collect()
}

/// Role of a block nested inside a postscript. There is no opener there.
pub fn nested_role(block: &Block) -> Role {
    match block {
        Block::Paragraph(_) if block.is_right_aligned() => Role::Dateline,
        Block::Paragraph(_) => Role::Paragraph,
        Block::Postscript(_) => Role::Postscript,
        Block::Unsupported { .. } => Role::Unsupported,
    }
}
