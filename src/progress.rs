//! Progress-callback trait for per-document conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as a batch moves through ingestion, transformation and rendering.
//! The CLI uses it to drive its progress bar.
//!
//! # Example
//!
//! ```rust
//! use autotei::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, input: &str, xml_len: usize, diagnostics: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{input}: {xml_len} bytes, {diagnostics} diagnostics");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the converter as it processes each document.
///
/// Batch conversion runs documents concurrently, so `on_document_*` may be
/// called from several tasks at once. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before a batch starts.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a document is loaded.
    fn on_document_start(&self, input: &str) {
        let _ = input;
    }

    /// Called when a document rendered successfully.
    ///
    /// # Arguments
    /// * `input`      : the path or URL as passed in
    /// * `xml_len`    : byte length of the rendered XML
    /// * `diagnostics`: number of heuristics that could not apply
    fn on_document_complete(&self, input: &str, xml_len: usize, diagnostics: usize) {
        let _ = (input, xml_len, diagnostics);
    }

    /// Called when a document failed; `error` is human-readable.
    fn on_document_error(&self, input: &str, error: &str) {
        let _ = (input, error);
    }

    /// Called once after every document in the batch has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
