//! CLI binary for html2pdf.
//!
//! A thin shim over the library crate that maps CLI flags and the optional
//! settings file to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use html2pdf::{
    convert, convert_to_file, inspect, write_pdf, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, ConversionStage, ProgressCallback, Settings,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar advancing through the pipeline
/// stages, with a dimmed log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(100);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &str) {
        self.bar.set_message(input.to_string());
    }

    fn on_stage_start(&self, stage: ConversionStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: ConversionStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{elapsed_ms}ms"))
        ));
        self.bar.set_position(u64::from(stage.percent_complete()));
    }

    fn on_conversion_complete(&self, _output_bytes: usize) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_error(&self, _error: &str) {
        self.bar.abandon();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the current directory (report.pdf)
  html2pdf report.html

  # Explicit output path
  html2pdf report.html out/report.pdf

  # Timestamped name: report_20250101_120000.pdf
  html2pdf --timestamp report.html

  # Convert from URL and show sizes
  html2pdf --details https://example.org/handbook.html

  # See what normalisation does without rendering
  html2pdf --inspect-only report.html

  # Summary and stats as JSON
  html2pdf --json report.html > report.json

SETTINGS FILE (--config / HTML2PDF_CONFIG):
  [conversion]
  add_timestamp = true
  show_details = true
  title = "Handbook"
  download_timeout_secs = 60
  font_embedding = true
  output_dir = "pdf"

  Command-line flags take precedence over the file.

FORMATTING:
  Every document is printed on US Letter with 1 cm margins, 11pt Arial at
  1.6 line height, a fixed heading scale and bordered tables. Author
  stylesheets and inline styles are discarded. This is not configurable.
"#;

/// Convert HTML files and URLs to consistently formatted PDF.
#[derive(Parser, Debug)]
#[command(
    name = "html2pdf",
    version,
    about = "Convert HTML files and URLs to consistently formatted PDF",
    long_about = "Convert HTML documents (local files or URLs) to PDF. Author styling is \
replaced by one fixed rule set so every document comes out with the same fonts, spacing \
and margins.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local HTML file path or HTTP/HTTPS URL.
    input: String,

    /// Write the PDF here. Default: derived from the input name.
    output: Option<PathBuf>,

    /// Append _YYYYmmdd_HHMMSS to a derived output file name.
    #[arg(long, env = "HTML2PDF_TIMESTAMP")]
    timestamp: bool,

    /// Print input size, output size and compression ratio.
    #[arg(long, env = "HTML2PDF_DETAILS")]
    details: bool,

    /// Document title written into the PDF.
    #[arg(long, env = "HTML2PDF_TITLE")]
    title: Option<String>,

    /// Print summary and stats as JSON on stdout.
    #[arg(long, env = "HTML2PDF_JSON")]
    json: bool,

    /// Print the normalisation summary only, no PDF.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "HTML2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HTML2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "HTML2PDF_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "HTML2PDF_DOWNLOAD_TIMEOUT")]
    download_timeout: Option<u64>,

    /// TOML settings file with a [conversion] table.
    #[arg(long, env = "HTML2PDF_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    exit_code(run(&cli, show_progress).await)
}

/// Report a failed run on stderr and map the outcome to the process status.
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", red("✗"), bold(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let settings = match cli.config {
        Some(ref path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(cli, &settings, None)?;
        let doc = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect HTML")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&doc).context("Failed to serialise summary")?
            );
        } else {
            let s = &doc.summary;
            println!("File:            {}", cli.input);
            if let Some(ref t) = s.title {
                println!("Title:           {}", t);
            }
            println!("Paragraphs:      {}", s.paragraphs);
            println!("Headings:        {}", s.headings);
            println!("Tables:          {}", s.tables);
            println!("Restyled:        {}", s.restyled_elements);
            println!("Style blocks:    {} removed", s.removed_style_blocks);
            println!("Inline styles:   {} discarded", s.discarded_inline_styles);
            println!("Parser repairs:  {}", s.repaired_parse_errors);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, &settings, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let (output, path) = match cli.output {
        Some(ref path) => {
            let output = convert_to_file(&cli.input, path, &config)
                .await
                .context("Conversion failed")?;
            (output, path.clone())
        }
        None => {
            let output = convert(&cli.input, &config)
                .await
                .context("Conversion failed")?;
            let dir = settings
                .conversion
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            let path = dir.join(&output.file_name);
            write_pdf(&path, &output.pdf)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            (output, path)
        }
    };

    if cli.json {
        print_json(&output, &path)?;
    } else if !cli.quiet {
        eprintln!(
            "{} PDF created successfully: {} {}",
            green("✓"),
            bold(&path.display().to_string()),
            dim(&format!("({} bytes)", output.stats.output_bytes)),
        );
        if config.show_details {
            print_details(&output);
        }
    }

    Ok(())
}

/// Map settings file and CLI args to `ConversionConfig`. Flags win.
fn build_config(
    cli: &Cli,
    settings: &Settings,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let file = &settings.conversion;

    let mut builder = ConversionConfig::builder()
        .settings(file)
        .add_timestamp(cli.timestamp || file.add_timestamp.unwrap_or(false))
        .show_details(cli.details || file.show_details.unwrap_or(false));

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(secs) = cli.download_timeout {
        builder = builder.download_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_details(output: &ConversionOutput) {
    let stats = &output.stats;
    let summary = &output.summary;
    eprintln!("   Input size:   {} characters", stats.input_chars);
    eprintln!("   Output size:  {} bytes", stats.output_bytes);
    eprintln!("   Compression:  {:.1}%", stats.compression_ratio());
    eprintln!(
        "   {}",
        dim(&format!(
            "{} paragraphs, {} headings, {} tables, {} parser repairs, {}ms total",
            summary.paragraphs,
            summary.headings,
            summary.tables,
            summary.repaired_parse_errors,
            stats.total_duration_ms
        ))
    );
}

fn print_json(output: &ConversionOutput, path: &Path) -> Result<()> {
    let mut value = serde_json::to_value(output).context("Failed to serialise output")?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "output_path".into(),
            serde_json::Value::String(path.display().to_string()),
        );
        obj.insert(
            "compression_ratio".into(),
            serde_json::json!(output.stats.compression_ratio()),
        );
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&value).context("Failed to serialise output")?
    );
    Ok(())
}
