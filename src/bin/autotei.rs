//! CLI binary for autotei.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use autotei::pipeline::input::display_name;
use autotei::{
    write_output, ConversionConfig, ConversionProgressCallback, Converter,
    DocumentSummary, ProgressCallback,
};
use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for batches: a live bar plus one log line per
/// document. Documents finish out of order, so start times are keyed by input.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} letters  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, input: &str) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(input)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} letters…"))
        ));
    }

    fn on_document_start(&self, input: &str) {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(input.to_string(), Instant::now());
        self.bar.set_message(input.to_string());
    }

    fn on_document_complete(&self, input: &str, xml_len: usize, diagnostics: usize) {
        let elapsed = self.elapsed_secs(input);
        let notes = if diagnostics == 0 {
            String::new()
        } else {
            cyan(&format!("  {diagnostics} diagnostics"))
        };
        self.bar.println(format!(
            "  {} {:<32}  {}  {}{}",
            green("✓"),
            input,
            dim(&format!("{xml_len:>6} bytes")),
            dim(&format!("{elapsed:.2}s")),
            notes,
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, input: &str, error: &str) {
        let elapsed = self.elapsed_secs(input);

        // Keep the log tidy; the full error is reported again at the end.
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            input,
            red(first_line),
            dim(&format!("{elapsed:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} letters converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} letters converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Convert one letter to stdout
  autotei brief_12.docx --editor HS

  # Convert to a file with a fixed edit date
  autotei brief_12.docx -o brief_12.xml --date 2024-03-05

  # Convert a folder of letters
  autotei letters/*.docx --out-dir tei/ --concurrency 8

  # Convert from URL
  autotei https://example.org/hsa/brief_12.docx -o brief_12.xml

  # Show what the heuristics found, without rendering
  autotei --inspect-only brief_12.docx

  # Machine-readable output
  autotei --json brief_12.docx > brief_12.json

HEURISTICS:
  source line   the single centered paragraph: "12. Sender à Recipient"
  dateline      right-aligned paragraphs
  opener        first paragraph that is not right-aligned
  footnotes     trailing paragraphs starting with a "[n]" run
  closer        right-aligned salutation (grüss/herzlich) and signature
  postscript    everything after the closer
  highlights    green → persName, cyan → placeName, red → todo
  italic        hi rendition="#none"

ENVIRONMENT VARIABLES:
  AUTOTEI_EDITOR      Editor initials for the header comment
  AUTOTEI_DATE        Fixed edit date (YYYY-MM-DD)
  AUTOTEI_INDENT      Spaces per nesting level (0–8)
  AUTOTEI_OUT_DIR     Output directory for batch conversion
  RUST_LOG            Log filter, overrides --verbose/--quiet
"##;

/// Convert transcribed letters from .docx to TEI pseudo-XML.
#[derive(Parser, Debug)]
#[command(
    name = "autotei",
    version,
    about = "Convert transcribed letters from .docx to TEI pseudo-XML",
    long_about = "Convert transcribed letters (local .docx files or URLs) to TEI-encoded \
pseudo-XML. Layout heuristics recover the source line, dateline, opener, footnotes, closer \
and postscript; highlight colours become name and place markup.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .docx file paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write XML to this file instead of stdout (single input only).
    #[arg(short, long, env = "AUTOTEI_OUTPUT", conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Write one `<name>.xml` per input into this directory.
    #[arg(long, env = "AUTOTEI_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Editor initials recorded in the header comment.
    #[arg(short, long, env = "AUTOTEI_EDITOR", default_value = "")]
    editor: String,

    /// Fixed "last edit" date (YYYY-MM-DD). Default: today.
    #[arg(long, env = "AUTOTEI_DATE", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Spaces per nesting level (0–8).
    #[arg(long, env = "AUTOTEI_INDENT", default_value_t = 2,
          value_parser = clap::value_parser!(u8).range(0..=8))]
    indent: u8,

    /// Number of documents converted concurrently.
    #[arg(short, long, env = "AUTOTEI_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "AUTOTEI_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (XML, canonical document, diagnostics, stats).
    #[arg(long, env = "AUTOTEI_JSON")]
    json: bool,

    /// Report the detected structure only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "AUTOTEI_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AUTOTEI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "AUTOTEI_QUIET")]
    quiet: bool,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        anyhow::bail!("--output takes a single input; use --out-dir for several");
    }
    let batch = cli.out_dir.is_some() || cli.inputs.len() > 1;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports every document, so library logs are
    // limited to errors while it is shown.
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let converter = Converter::new(build_config(&cli, progress_cb)?);

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return run_inspect(&cli, &converter).await;
    }

    // ── Run conversion ───────────────────────────────────────────────────
    if batch {
        run_batch(&cli, &converter).await
    } else {
        run_single(&cli, &converter, &cli.inputs[0]).await
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .editor(cli.editor.clone())
        .indent(cli.indent as usize)
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout);

    if let Some(date) = cli.date {
        builder = builder.date(date);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_single(cli: &Cli, converter: &Converter, input: &str) -> Result<()> {
    let output = converter
        .convert(input)
        .await
        .with_context(|| format!("Conversion of '{input}' failed"))?;

    if let Some(ref path) = cli.output {
        let contents = if cli.json {
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        } else {
            output.xml.clone()
        };
        write_output(path, &contents).await?;
        if !cli.quiet {
            eprintln!(
                "{}  {} paragraphs, {} footnotes  {}ms  →  {}",
                green("✔"),
                output.stats.paragraphs,
                output.stats.footnotes,
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        handle
            .write_all(output.xml.as_bytes())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}

async fn run_batch(cli: &Cli, converter: &Converter) -> Result<()> {
    let Some(ref out_dir) = cli.out_dir else {
        anyhow::bail!("Several inputs need --out-dir");
    };
    let targets = output_targets(out_dir, &cli.inputs)?;

    let results = converter.convert_batch(&cli.inputs).await;

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for ((input, path), result) in cli.inputs.iter().zip(&targets).zip(results) {
        match result {
            Ok(output) => {
                write_output(path, &output.xml).await?;
                reports.push(serde_json::json!({
                    "input": input,
                    "output": path,
                    "stats": output.stats,
                    "diagnostics": output.diagnostics(),
                }));
            }
            Err(e) => {
                reports.push(serde_json::json!({ "input": input, "error": e.to_string() }));
                failures.push(format!("{input}: {e}"));
            }
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialise report")?
        );
    }

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{} {}", red("✗"), failure);
        }
        anyhow::bail!("{} of {} documents failed", failures.len(), cli.inputs.len());
    }
    Ok(())
}

async fn run_inspect(cli: &Cli, converter: &Converter) -> Result<()> {
    let mut summaries = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let summary = converter
            .inspect(input)
            .await
            .with_context(|| format!("Failed to inspect '{input}'"))?;
        summaries.push(summary);
    }

    if cli.json {
        let json = if let [only] = summaries.as_slice() {
            serde_json::to_string_pretty(only)
        } else {
            serde_json::to_string_pretty(&summaries)
        }
        .context("Failed to serialise summary")?;
        println!("{json}");
    } else {
        for (i, summary) in summaries.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_summary(summary);
        }
    }
    Ok(())
}

fn print_summary(s: &DocumentSummary) {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    println!("File:         {}", s.name);
    println!("Letter:       {}", or_dash(s.doc_number.map(|n| n.to_string())));
    println!("Source:       {}", or_dash(s.source.clone()));
    match &s.closer {
        Some(c) => println!(
            "Closer:       salute {:?}, signed {:?} (before child {})",
            c.salute.as_deref().unwrap_or("-"),
            c.signed.as_deref().unwrap_or("-"),
            c.index
        ),
        None => println!("Closer:       -"),
    }
    println!("Paragraphs:   {}", s.paragraphs);
    println!(
        "Footnotes:    {} ({} references)",
        s.footnotes, s.footnote_references
    );
    println!("Postscript:   {}", if s.has_postscript { "yes" } else { "no" });
    if s.diagnostics.is_empty() {
        println!("Diagnostics:  none");
    } else {
        println!("Diagnostics:");
        for d in &s.diagnostics {
            println!("  - {d}");
        }
    }
}

/// `letters/brief_12.docx` → `brief_12.xml`.
fn output_file_name(input: &str) -> PathBuf {
    Path::new(&display_name(input)).with_extension("xml")
}

/// One output path per input under `out_dir`. Two inputs that would land on
/// the same file are an error.
fn output_targets(out_dir: &Path, inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    let mut targets = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = out_dir.join(output_file_name(input));
        if let Some(first) = seen.insert(path.clone(), input) {
            anyhow::bail!(
                "'{first}' and '{input}' would both be written to {}",
                path.display()
            );
        }
        targets.push(path);
    }
    Ok(targets)
}
