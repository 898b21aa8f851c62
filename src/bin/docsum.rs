//! CLI binary for docsum.
//!
//! A thin shim over the library crate that maps CLI flags to `SummaryConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docsum::{
    extract_and_summarize, resummarize, resummarize_to_file, summarize_to_file, Document,
    LengthBucket, SummaryConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarize a document (stdout)
  docsum report.pdf

  # Longer summary, written to a file
  docsum report.pdf --length long -o summary.md

  # Scanned page as an image
  docsum invoice.png --length short

  # Use a specific model as the first candidate
  docsum --model gemini-2.5-flash report.pdf

  # Regenerate from previously extracted text
  docsum --from-text extracted.txt --length short

  # Print the extracted text instead of the summary
  docsum report.pdf --extract-only

  # Structured JSON output (extracted text + summary + stats)
  docsum --json report.pdf > result.json

MODEL FALLBACK:
  Candidates are tried in order until one answers:
    1. --model (if given)
    2. gemini-2.0-flash
    3. gemini-1.5-flash
    4. gemini-1.5-flash-8b
  Each candidate gets up to --max-retries attempts with exponential backoff
  when the service reports overload (HTTP 503 / UNAVAILABLE).

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY   Gemini API key (required)

SETUP:
  1. Set API key:  export GEMINI_API_KEY=...
  2. Summarize:    docsum report.pdf -o summary.md
"#;

/// Summarize PDF and image documents using Gemini multimodal models.
#[derive(Parser, Debug)]
#[command(
    name = "docsum",
    version,
    about = "Summarize PDF and image documents using Gemini multimodal models",
    long_about = "Extract text from a PDF, PNG, or JPEG document and produce a structured \
Markdown summary (title, key takeaways, detailed explanation) at a chosen target length, \
with automatic retry and model fallback.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF, PNG, or JPEG document to summarize (or a text file with --from-text).
    input: PathBuf,

    /// Write the summary Markdown to this file instead of stdout.
    #[arg(short, long, env = "DOCSUM_OUTPUT")]
    output: Option<PathBuf>,

    /// Target summary length: short (~50-80 words), medium (~120-160), long (~250-300).
    #[arg(short, long, env = "DOCSUM_LENGTH", value_enum, default_value = "medium")]
    length: LengthArg,

    /// Model tried as the first candidate (e.g. gemini-2.0-flash).
    #[arg(long, env = "DOCSUM_MODEL")]
    model: Option<String>,

    /// Treat the input as previously extracted plain text and regenerate
    /// the summary from it (no document upload).
    #[arg(long)]
    from_text: bool,

    /// Print the extracted text instead of the summary.
    #[arg(long, conflicts_with = "from_text")]
    extract_only: bool,

    /// Output structured JSON (extracted text, summary, stats) instead of Markdown.
    #[arg(long, env = "DOCSUM_JSON")]
    json: bool,

    /// Attempts per model when the service reports overload.
    #[arg(long, env = "DOCSUM_MAX_RETRIES", default_value_t = 5)]
    max_retries: u32,

    /// Per-request transport timeout in seconds.
    #[arg(long, env = "DOCSUM_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "DOCSUM_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LengthArg {
    Short,
    Medium,
    Long,
}

impl From<LengthArg> for LengthBucket {
    fn from(v: LengthArg) -> Self {
        match v {
            LengthArg::Short => LengthBucket::Short,
            LengthArg::Medium => LengthBucket::Medium,
            LengthArg::Long => LengthBucket::Long,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the only feedback most users need; library logs
    // surface at WARN (retries, fallbacks) unless --verbose is given.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    let length: LengthBucket = cli.length.clone().into();
    let mut config = SummaryConfig::builder()
        .max_attempts(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .build()
        .context("Invalid configuration")?;
    config.model = cli.model.clone();

    let spinner = if cli.quiet || cli.no_progress || cli.json {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Analyzing your document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    };

    let result = run(&cli, length, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match result {
        Ok(RunOutput {
            body,
            model,
            attempts,
            duration_ms,
        }) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(body.as_bytes())
                .context("Failed to write to stdout")?;
            if !body.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&model),
                    dim(&format!("{attempts} attempt(s), {duration_ms}ms")),
                );
            }
            Ok(())
        }
        Err(err) => {
            // Classification detail goes to the log; the user sees the
            // short stable message.
            tracing::error!("{err}");
            anyhow::bail!("{}", err.user_message())
        }
    }
}

struct RunOutput {
    body: String,
    model: String,
    attempts: u32,
    duration_ms: u64,
}

async fn run(
    cli: &Cli,
    length: LengthBucket,
    config: &SummaryConfig,
) -> Result<RunOutput, docsum::DocsumError> {
    if cli.from_text {
        let text = std::fs::read_to_string(&cli.input).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => docsum::DocsumError::FileNotFound {
                path: cli.input.clone(),
            },
            _ => docsum::DocsumError::Internal(format!(
                "failed to read '{}': {e}",
                cli.input.display()
            )),
        })?;
        let result = if let Some(ref output_path) = cli.output {
            resummarize_to_file(&text, length, config, output_path).await?
        } else {
            resummarize(&text, length, config).await?
        };
        let body = if cli.json {
            serde_json::to_string_pretty(&result)
                .map_err(|e| docsum::DocsumError::Internal(e.to_string()))?
        } else if let Some(ref output_path) = cli.output {
            format!("Summary written to {}", output_path.display())
        } else {
            result.markdown.clone()
        };
        return Ok(RunOutput {
            body,
            model: result.stats.model,
            attempts: result.stats.attempts,
            duration_ms: result.stats.duration_ms,
        });
    }

    let document = Document::from_path(&cli.input)?;

    let result = if let Some(ref output_path) = cli.output {
        summarize_to_file(&document, length, config, output_path).await?
    } else {
        extract_and_summarize(&document, length, config).await?
    };

    let body = if cli.json {
        serde_json::to_string_pretty(&result)
            .map_err(|e| docsum::DocsumError::Internal(e.to_string()))?
    } else if cli.extract_only {
        result.extracted_text.clone()
    } else if cli.output.is_some() {
        // Summary already written to the file; echo where it went.
        format!("Summary written to {}", cli.output.as_ref().unwrap().display())
    } else {
        result.summary.clone()
    };

    Ok(RunOutput {
        body,
        model: result.stats.model,
        attempts: result.stats.attempts,
        duration_ms: result.stats.duration_ms,
    })
}
