//! Conversion entry points.
//!
//! A [`Converter`] owns the decoder and the document cache. Each conversion
//! goes through the same steps:
//!
//! ```text
//! input ──▶ load (cache ▸ decode ▸ transform) ──▶ render ──▶ output
//! ```
//!
//! Only loading suspends; transformation and rendering are synchronous. The
//! free functions at the bottom of this module build a one-shot converter
//! for callers that convert a single document.

use crate::cache::DocumentCache;
use crate::config::ConversionConfig;
use crate::error::AutoTeiError;
use crate::output::{ConversionOutput, ConversionStats, Counts, DocumentSummary};
use crate::pipeline::docx::{decode_blocking, DocumentDecoder, DocxDecoder};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::render::render_document;
use crate::pipeline::transform::{transform, Transformed};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Converter {
    config: ConversionConfig,
    decoder: Arc<dyn DocumentDecoder>,
    cache: DocumentCache,
}

impl Converter {
    /// A converter for `.docx` input.
    pub fn new(config: ConversionConfig) -> Self {
        Self::with_decoder(config, Arc::new(DocxDecoder))
    }

    /// A converter with a custom ingestion backend.
    pub fn with_decoder(config: ConversionConfig, decoder: Arc<dyn DocumentDecoder>) -> Self {
        Self {
            config,
            decoder,
            cache: DocumentCache::new(),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Ingest and transform `bytes`, or return the document already cached
    /// under `identity`.
    pub async fn load(
        &self,
        identity: &str,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Arc<Transformed>, AutoTeiError> {
        let decoder = Arc::clone(&self.decoder);
        let bytes = bytes.into();
        let label = identity.to_string();

        self.cache
            .get_or_load(identity, move || async move {
                let start = Instant::now();
                let raw = decode_blocking(decoder, bytes).await?;
                let transformed = transform(raw);
                info!(
                    identity = %label,
                    children = transformed.document.children.len(),
                    diagnostics = transformed.diagnostics.len(),
                    "Loaded document in {}ms",
                    start.elapsed().as_millis()
                );
                Ok(transformed)
            })
            .await
            .map_err(|source| AutoTeiError::Ingest {
                identity: identity.to_string(),
                source,
            })
    }

    /// Convert in-memory document bytes to TEI.
    pub async fn convert_bytes(
        &self,
        identity: &str,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<ConversionOutput, AutoTeiError> {
        let total_start = Instant::now();
        let cached = self.cache.is_ready(identity);

        // ── Step 1: Load ─────────────────────────────────────────────────
        let transformed = self.load(identity, bytes).await?;
        let load_duration_ms = total_start.elapsed().as_millis() as u64;

        // ── Step 2: Render ───────────────────────────────────────────────
        let render_start = Instant::now();
        let xml = render_document(&transformed.document, &self.config.render_context());
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        // ── Step 3: Stats ────────────────────────────────────────────────
        let stats = ConversionStats {
            cached,
            load_duration_ms,
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            ..Counts::of(&transformed.document).stats(transformed.diagnostics.len())
        };

        info!(
            identity,
            xml_bytes = xml.len(),
            diagnostics = stats.diagnostics,
            cached,
            "Conversion complete in {}ms",
            stats.total_duration_ms
        );

        Ok(ConversionOutput {
            identity: identity.to_string(),
            name: input::display_name(identity),
            xml,
            transformed,
            stats,
        })
    }

    /// Resolve a local path or URL and convert it.
    pub async fn convert(&self, input: &str) -> Result<ConversionOutput, AutoTeiError> {
        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_document_start(input);
        }

        let result = self.convert_unreported(input).await;

        if let Some(cb) = callback {
            match &result {
                Ok(out) => cb.on_document_complete(input, out.xml.len(), out.stats.diagnostics),
                Err(e) => cb.on_document_error(input, &e.to_string()),
            }
        }
        result
    }

    async fn convert_unreported(&self, input: &str) -> Result<ConversionOutput, AutoTeiError> {
        info!("Starting conversion: {}", input);
        let ResolvedInput { identity, bytes } =
            input::resolve_input(input, self.config.download_timeout_secs).await?;
        self.convert_bytes(&identity, bytes).await
    }

    /// Convert several inputs concurrently. Results come back in input order;
    /// one failing document does not stop the others.
    pub async fn convert_batch<S: AsRef<str>>(
        &self,
        inputs: &[S],
    ) -> Vec<Result<ConversionOutput, AutoTeiError>> {
        let total = inputs.len();
        if let Some(cb) = &self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut results: Vec<(usize, Result<ConversionOutput, AutoTeiError>)> =
            stream::iter(inputs.iter().enumerate().map(|(i, input)| async move {
                let result = self.convert(input.as_ref()).await;
                if let Err(ref e) = result {
                    warn!("{}: {}", input.as_ref(), e);
                }
                (i, result)
            }))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        results.sort_by_key(|(i, _)| *i);

        let success = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!("Batch complete: {}/{} documents", success, total);
        if let Some(cb) = &self.config.progress_callback {
            cb.on_batch_complete(total, success);
        }

        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Convert one input and write the XML to `output_path`.
    pub async fn convert_to_file(
        &self,
        input: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<ConversionStats, AutoTeiError> {
        let output = self.convert(input).await?;
        write_output(output_path.as_ref(), &output.xml).await?;
        Ok(output.stats)
    }

    /// Load a document and report what the heuristics found, without
    /// rendering.
    pub async fn inspect(&self, input: &str) -> Result<DocumentSummary, AutoTeiError> {
        let ResolvedInput { identity, bytes } =
            input::resolve_input(input, self.config.download_timeout_secs).await?;
        let transformed = self.load(&identity, bytes).await?;
        Ok(DocumentSummary::new(identity, &transformed))
    }
}

/// Write `contents` to `path` atomically (temp file + rename), creating
/// parent directories as needed.
pub async fn write_output(path: &Path, contents: &str) -> Result<(), AutoTeiError> {
    let write_failed = |source| AutoTeiError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("xml.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

// ── One-shot helpers ─────────────────────────────────────────────────────

/// Convert a `.docx` file or URL to TEI.
///
/// # Example
/// ```rust,no_run
/// use autotei::{convert, ConversionConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConversionConfig::builder().editor("HS").build()?;
///     let output = convert("brief_12.docx", &config).await?;
///     println!("{}", output.xml);
///     for d in output.diagnostics() {
///         eprintln!("warning: {d}");
///     }
///     Ok(())
/// }
/// ```
pub async fn convert(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, AutoTeiError> {
    Converter::new(config.clone()).convert(input.as_ref()).await
}

/// Convert and write the result to a file atomically.
pub async fn convert_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, AutoTeiError> {
    Converter::new(config.clone())
        .convert_to_file(input.as_ref(), output_path)
        .await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, AutoTeiError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AutoTeiError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Report what the structural heuristics find in a document.
pub async fn inspect(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentSummary, AutoTeiError> {
    Converter::new(config.clone()).inspect(input.as_ref()).await
}
