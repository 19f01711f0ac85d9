//! # autotei
//!
//! Convert transcribed letters from `.docx` into TEI-encoded pseudo-XML.
//!
//! ## Why this crate?
//!
//! Transcribers type letters in a word processor: a centered source line,
//! a right-aligned place/date line, footnotes as `[n]` paragraphs at the end,
//! a right-aligned salutation and signature, names marked with highlight
//! colours. This crate recovers that structure with a handful of layout
//! heuristics and emits a TEI skeleton an editor can finish by hand.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Ingest     zip + WordprocessingML → generic tree (spawn_blocking)
//!  ├─ 3. Transform  source line, footnotes, closer, prune, postscript
//!  ├─ 4. Render     TEI text with header, roles and inline markup
//!  └─ 5. Output     XML + canonical document + diagnostics + stats
//! ```
//!
//! Heuristics never fail a conversion. When one cannot classify its input it
//! leaves that region untouched and records a [`Diagnostic`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autotei::{ConversionConfig, Converter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().editor("HS").build()?;
//!     let converter = Converter::new(config);
//!     let output = converter.convert("brief_12.docx").await?;
//!     println!("{}", output.xml);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `autotei` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod raw;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::DocumentCache;
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, convert_to_file, inspect, write_output, Converter};
pub use document::LetterDocument;
pub use error::{AutoTeiError, Diagnostic, IngestError};
pub use output::{ConversionOutput, ConversionStats, DocumentSummary};
pub use pipeline::docx::{DocumentDecoder, DocxDecoder};
pub use pipeline::render::{render_document, RenderContext};
pub use pipeline::transform::{transform, Transformed};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
