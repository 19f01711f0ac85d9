//! Pipeline stages for `.docx` → TEI conversion.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ docx ──▶ transform ──▶ render
//! (path/URL) (zip+XML) (5 passes)   (TEI text)
//! ```
//!
//! 1. [`input`]    : read a local file or download a URL; check the zip magic
//! 2. [`docx`]     : decode the package into the generic [`crate::raw`] tree;
//!    runs in `spawn_blocking` because it is CPU-bound
//! 3. [`transform`]: lower to [`crate::document`] and run the structural
//!    heuristics (source line, footnotes, closer, pruning, postscript)
//! 4. [`render`]   : lay the canonical letter out as TEI pseudo-XML

pub mod docx;
pub mod input;
pub mod render;
pub mod transform;
