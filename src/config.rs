//! Configuration types for `.docx` → TEI conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The structural heuristics themselves
//! take no options; the config only covers what gets stamped into the output
//! (editor, date, indentation) and how inputs are fetched and scheduled.

use crate::error::AutoTeiError;
use crate::pipeline::render::RenderContext;
use crate::progress::ProgressCallback;
use chrono::NaiveDate;
use std::fmt;

/// Widest indentation unit the builder accepts.
pub const MAX_INDENT: usize = 8;

/// Configuration for a conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use autotei::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .editor("HS")
///     .indent(4)
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Editor initials written into the header comment. Default: empty.
    pub editor: String,

    /// Fixed "last edit" date. If None, today's local date is used at render
    /// time.
    ///
    /// Fixing the date makes repeated runs byte-identical, which is what
    /// tests and diff-based review want.
    pub date: Option<NaiveDate>,

    /// Spaces per nesting level in the rendered XML. Range: 0–8. Default: 2.
    pub indent: usize,

    /// Number of documents ingested concurrently by batch conversion. Default: 4.
    ///
    /// Ingestion is CPU-bound zip + XML decoding on the blocking pool, so
    /// values far above the core count buy nothing.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            editor: String::new(),
            date: None,
            indent: 2,
            concurrency: 4,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("editor", &self.editor)
            .field("date", &self.date)
            .field("indent", &self.indent)
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The date to stamp into output rendered now.
    pub fn edit_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Render settings derived from this config, resolving the date.
    pub fn render_context(&self) -> RenderContext {
        RenderContext {
            editor: self.editor.clone(),
            date: self.edit_date(),
            indent: self.indent,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn editor(mut self, editor: impl Into<String>) -> Self {
        self.config.editor = editor.into();
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.config.date = Some(date);
        self
    }

    /// Not clamped; out-of-range values are rejected by [`Self::build`].
    pub fn indent(mut self, width: usize) -> Self {
        self.config.indent = width;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, AutoTeiError> {
        let c = &self.config;
        if c.indent > MAX_INDENT {
            return Err(AutoTeiError::InvalidConfig(format!(
                "Indent must be 0–{}, got {}",
                MAX_INDENT, c.indent
            )));
        }
        // The editor is written into an XML comment, where `--` is not allowed.
        if c.editor.contains("--") {
            return Err(AutoTeiError::InvalidConfig(format!(
                "Editor must not contain \"--\", got {:?}",
                c.editor
            )));
        }
        if c.concurrency == 0 {
            return Err(AutoTeiError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(AutoTeiError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
