//! Error types for the autotei library.
//!
//! Three distinct types reflect three distinct failure modes:
//!
//! * [`AutoTeiError`]: **Fatal**: the conversion of one document cannot
//!   proceed at all (file not found, download failed, not a `.docx`, output
//!   not writable). Returned as `Err` from the top-level entry points.
//!
//! * [`IngestError`]: **Fatal to one document**: the bytes could not be
//!   decoded into a paragraph tree. It is `Clone` because the cache hands the
//!   same failure to every caller that joined the in-flight decode.
//!
//! * [`Diagnostic`]: **Non-fatal**: a structural heuristic could not apply
//!   (no source line, ambiguous closer, duplicate footnote). The region is left
//!   as it was and the diagnostic is stored alongside the converted document.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the autotei library.
#[derive(Debug, Error)]
pub enum AutoTeiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read, but is not a zip-based `.docx` package.
    #[error("'{input}' is not a .docx document\nFirst bytes: {magic:?}")]
    NotADocx { input: String, magic: [u8; 4] },

    // ── Ingestion errors ──────────────────────────────────────────────────
    /// The document body could not be decoded.
    #[error("Failed to read '{identity}': {source}")]
    Ingest {
        identity: String,
        #[source]
        source: IngestError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output XML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure to turn document bytes into a paragraph tree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IngestError {
    /// The bytes are not a readable zip container.
    #[error("not a zip archive: {0}")]
    Archive(String),

    /// The package has no main document part.
    #[error("package has no '{0}' part")]
    MissingPart(String),

    /// The main document part is not well-formed XML.
    #[error("malformed document XML at byte {position}: {detail}")]
    Xml { position: u64, detail: String },

    /// The decoding task did not complete.
    #[error("decoder task failed: {0}")]
    Task(String),
}

/// A non-fatal finding of the structural transformer or renderer.
///
/// Each variant names the heuristic that declined to act; the affected part
/// of the document is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("no centered source paragraph found")]
    SourceMissing,

    #[error("{count} centered paragraphs found; expected exactly one source line")]
    SourceAmbiguous { count: usize },

    #[error("footnote [{number}] defined more than once; keeping the later definition")]
    DuplicateFootnote { number: u32 },

    #[error("no closer found; expected 2 right-aligned paragraphs")]
    CloserMissing,

    #[error("closer paragraph {index} not recognised as salute or signature: {text:?}")]
    CloserUnrecognized { index: usize, text: String },

    #[error("closer paragraphs {first} and {second} not recognised as salute/signature")]
    CloserPairUnrecognized { first: usize, second: usize },

    #[error("{count} right-aligned paragraphs found; expected at most 2 closer lines")]
    CloserAmbiguous { count: usize },
}
