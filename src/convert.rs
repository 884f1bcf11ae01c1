//! Conversion entry points.
//!
//! Every entry point funnels into the same pipeline:
//!
//! ```text
//! read ──▶ sanitize ──▶ normalize ──▶ template ──▶ render ──▶ finalize
//! ```
//!
//! One call produces exactly one PDF or one error. Nothing is kept between
//! calls, so any number of conversions may run concurrently.

use crate::config::ConversionConfig;
use crate::error::Html2PdfError;
use crate::output::{ConversionOutput, ConversionStats, DocumentSummary};
use crate::pipeline::normalize::{normalize_html, NormalizedDocument};
use crate::pipeline::sanitize::sanitize_html;
use crate::pipeline::{document, finalize, input, render};
use crate::progress::ConversionStage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert an HTML file or URL to PDF.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str`: Local file path or HTTP/HTTPS URL to an HTML document
/// * `config`: Conversion configuration
///
/// # Errors
/// - File not found / permission denied / unreadable
/// - Download failure or timeout
/// - Empty, non-UTF-8 or binary input
/// - Rendering failure
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    let input_str = input_str.as_ref();
    let total_start = Instant::now();
    info!("Starting conversion: {}", input_str);
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(input_str);
    }

    let result = async {
        let timer = StageTimer::start(config, ConversionStage::Read);
        let source = input::resolve_input(input_str, config.download_timeout_secs).await?;
        timer.finish();
        run_pipeline(&source.stem, vec![(source.name, source.html)], config, total_start).await
    }
    .await;

    report(config, result)
}

/// Convert HTML bytes held in memory, e.g. an upload.
///
/// `name` is only used for messages and to derive the output file name.
///
/// # Example
/// ```rust,no_run
/// use html2pdf::{convert_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::builder().add_timestamp(false).build()?;
/// let output = convert_bytes("notes.html", b"<h1>Notes</h1>", &config).await?;
/// assert_eq!(output.file_name, "notes.pdf");
/// # Ok(())
/// # }
/// ```
pub async fn convert_bytes(
    name: &str,
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    let total_start = Instant::now();
    info!("Starting conversion: {} ({} bytes)", name, bytes.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(name);
    }

    let result = async {
        let timer = StageTimer::start(config, ConversionStage::Read);
        let source = input::SourceDocument::from_bytes(name, bytes)?;
        timer.finish();
        run_pipeline(&source.stem, vec![(source.name, source.html)], config, total_start).await
    }
    .await;

    report(config, result)
}

/// Convert several HTML fragments into one PDF, each starting on a new page.
///
/// Every fragment is sanitised and normalised on its own; the summary adds
/// their counts up. The output file name stem is the configured title, or
/// `document` when there is none.
pub async fn convert_pages(
    pages: &[String],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    let total_start = Instant::now();
    let label = format!("{} pages", pages.len());
    info!("Starting conversion: {}", label);
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(&label);
    }

    let result = async {
        if pages.is_empty() {
            return Err(Html2PdfError::EmptyInput {
                name: "page list".into(),
            });
        }
        let timer = StageTimer::start(config, ConversionStage::Read);
        let sources = pages
            .iter()
            .enumerate()
            .map(|(i, html)| {
                let name = format!("page {}", i + 1);
                input::decode_html(&name, html.as_bytes()).map(|html| (name, html))
            })
            .collect::<Result<Vec<_>, _>>()?;
        timer.finish();

        let stem = config
            .title
            .as_deref()
            .map(title_stem)
            .unwrap_or_else(|| "document".to_string());
        run_pipeline(&stem, sources, config, total_start).await
    }
    .await;

    report(config, result)
}

/// Convert an HTML document and write the PDF directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();
    write_pdf(path, &output.pdf).await?;
    info!("Wrote {} ({} bytes)", path.display(), output.pdf.len());
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Html2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Html2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Sanitise and normalise without rendering.
///
/// Returns the body markup exactly as it would be handed to the renderer,
/// with the summary of what normalisation did. Useful to see why a PDF looks
/// the way it does.
///
/// Downloads honour `config.download_timeout_secs`; the remaining options
/// only affect rendering and are ignored here.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<NormalizedDocument, Html2PdfError> {
    let source =
        input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    prepare(&source.name, &source.html)
}

/// Output file name for a document stem: `<stem>.pdf`, or
/// `<stem>_YYYYmmdd_HHMMSS.pdf` with a local-time timestamp.
pub fn output_file_name(stem: &str, add_timestamp: bool) -> String {
    if add_timestamp {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!("{stem}_{stamp}.pdf")
    } else {
        format!("{stem}.pdf")
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// File stem from a free-text title: path separators and characters that
/// are invalid in file names become `_`, dots are kept.
fn title_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem.to_string()
    }
}

/// Markup after the regex pass, with the style blocks it already removed.
struct Sanitized {
    html: String,
    style_blocks: usize,
}

/// Sanitise then normalise one decoded document.
fn prepare(name: &str, html: &str) -> Result<NormalizedDocument, Html2PdfError> {
    normalize_source(name, sanitize_source(name, html))
}

fn sanitize_source(name: &str, html: &str) -> Sanitized {
    let (clean, report) = sanitize_html(html);
    debug!(
        "{}: {} style blocks, {} empty paragraphs, {} page numbers removed",
        name, report.style_blocks, report.empty_paragraphs, report.page_numbers
    );
    Sanitized {
        html: clean,
        style_blocks: report.style_blocks,
    }
}

fn normalize_source(
    name: &str,
    sanitized: Sanitized,
) -> Result<NormalizedDocument, Html2PdfError> {
    let mut normalized = normalize_html(&sanitized.html)?;
    normalized.summary.removed_style_blocks += sanitized.style_blocks;
    if normalized.summary.repaired_parse_errors > 0 {
        debug!(
            "{}: parser repaired {} errors",
            name, normalized.summary.repaired_parse_errors
        );
    }
    Ok(normalized)
}

/// Everything after reading: `sources` are `(name, html)` pairs, one per page.
async fn run_pipeline(
    stem: &str,
    sources: Vec<(String, String)>,
    config: &ConversionConfig,
    total_start: Instant,
) -> Result<ConversionOutput, Html2PdfError> {
    let input_chars: usize = sources.iter().map(|(_, html)| html.chars().count()).sum();

    // ── Sanitize ─────────────────────────────────────────────────────────
    let timer = StageTimer::start(config, ConversionStage::Sanitize);
    let cleaned: Vec<(String, Sanitized)> = sources
        .iter()
        .map(|(name, html)| (name.clone(), sanitize_source(name, html)))
        .collect();
    timer.finish();

    // ── Normalize ────────────────────────────────────────────────────────
    let timer = StageTimer::start(config, ConversionStage::Normalize);
    let mut summary = DocumentSummary::default();
    let mut bodies = Vec::with_capacity(cleaned.len());
    for (name, sanitized) in cleaned {
        let normalized = normalize_source(&name, sanitized)?;
        summary.absorb(normalized.summary);
        bodies.push(normalized.body);
    }
    let normalize_duration_ms = timer.finish();

    let title = config
        .title
        .clone()
        .or_else(|| summary.title.clone())
        .unwrap_or_else(|| stem.to_string());
    summary.title = Some(title.clone());

    let html = if bodies.len() == 1 {
        document::build_document(&title, &bodies[0], &config.page)
    } else {
        document::build_paged_document(&title, &bodies, &config.page)
    };

    // ── Render ───────────────────────────────────────────────────────────
    let timer = StageTimer::start(config, ConversionStage::Render);
    let rendered = render::render_pdf(html, config.page, config.font_embedding).await?;
    let render_duration_ms = timer.finish();
    if rendered.warnings > 0 {
        warn!("Renderer reported {} warnings", rendered.warnings);
    }

    // ── Finalize ─────────────────────────────────────────────────────────
    let timer = StageTimer::start(config, ConversionStage::Finalize);
    let pdf = finalize::finalize_pdf(&rendered.bytes, &title)?;
    timer.finish();

    let stats = ConversionStats {
        input_chars,
        output_bytes: pdf.len(),
        renderer_warnings: rendered.warnings,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        normalize_duration_ms,
        render_duration_ms,
    };

    info!(
        "Conversion complete: {} chars → {} bytes, {} PDF pages, {}ms total",
        stats.input_chars, stats.output_bytes, rendered.pages, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        file_name: output_file_name(stem, config.add_timestamp),
        pdf,
        summary,
        stats,
    })
}

/// Fire the terminal callback for `result` and pass it through.
fn report(
    config: &ConversionConfig,
    result: Result<ConversionOutput, Html2PdfError>,
) -> Result<ConversionOutput, Html2PdfError> {
    match (&result, &config.progress_callback) {
        (Ok(output), Some(cb)) => cb.on_conversion_complete(output.pdf.len()),
        (Err(e), Some(cb)) => cb.on_conversion_error(&e.to_string()),
        _ => {}
    }
    if let Err(ref e) = result {
        warn!("Conversion failed ({}): {}", e.category(), e);
    }
    result
}

/// Write PDF bytes to `path` atomically, creating parent directories.
pub async fn write_pdf(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), Html2PdfError> {
    let path = path.as_ref();
    let write_failed = |e: std::io::Error| Html2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    Ok(())
}

/// Times one stage and reports it to the progress callback.
struct StageTimer<'a> {
    config: &'a ConversionConfig,
    stage: ConversionStage,
    start: Instant,
}

impl<'a> StageTimer<'a> {
    fn start(config: &'a ConversionConfig, stage: ConversionStage) -> Self {
        debug!("Stage {} started", stage);
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(stage);
        }
        Self {
            config,
            stage,
            start: Instant::now(),
        }
    }

    /// Returns the elapsed milliseconds.
    fn finish(self) -> u64 {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        debug!("Stage {} finished in {}ms", self.stage, elapsed_ms);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_complete(self.stage, elapsed_ms);
        }
        elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_without_timestamp() {
        assert_eq!(output_file_name("report", false), "report.pdf");
    }

    #[test]
    fn file_name_with_timestamp() {
        let name = output_file_name("report", true);
        let stamp = name
            .strip_prefix("report_")
            .and_then(|s| s.strip_suffix(".pdf"))
            .unwrap();
        assert_eq!(stamp.len(), 15, "YYYYmmdd_HHMMSS: {name}");
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn prepare_counts_style_blocks_from_both_passes() {
        // The regex pass removes the terminated block; the DOM pass catches
        // the unterminated one it cannot match.
        let doc = prepare("a.html", "<style>p{}</style><p>a</p><style>h1{").unwrap();
        assert_eq!(doc.summary.removed_style_blocks, 2);
        assert!(doc.body.contains(">a</p>"));
    }

    #[test]
    fn title_stem_keeps_dots_and_replaces_separators() {
        assert_eq!(title_stem("Report v1.2"), "Report v1.2");
        assert_eq!(title_stem("Q3/Q4: results"), "Q3_Q4_ results");
        assert_eq!(title_stem(" ../notes. "), "_notes");
        assert_eq!(title_stem("   "), "document");
    }

    #[tokio::test]
    async fn inspect_uses_configured_download_timeout() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = ConversionConfig::builder()
            .download_timeout_secs(1)
            .build()
            .unwrap();
        let started = Instant::now();
        let err = inspect(format!("http://{addr}/page.html"), &config)
            .await
            .unwrap_err();
        match err {
            Html2PdfError::DownloadTimeout { secs, .. } => assert_eq!(secs, 1),
            other => panic!("expected DownloadTimeout, got {other:?}"),
        }
        assert!(started.elapsed().as_secs() < 30);
    }

    #[tokio::test]
    async fn empty_page_list_is_rejected() {
        let config = ConversionConfig::default();
        let err = convert_pages(&[], &config).await.unwrap_err();
        assert!(matches!(err, Html2PdfError::EmptyInput { .. }));
    }

    #[tokio::test]
    async fn blank_page_is_rejected_by_position() {
        let config = ConversionConfig::default();
        let pages = vec!["<p>one</p>".to_string(), "   ".to_string()];
        match convert_pages(&pages, &config).await {
            Err(Html2PdfError::EmptyInput { name }) => assert_eq!(name, "page 2"),
            other => panic!("expected EmptyInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        write_pdf(&path, b"%PDF-1.7").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(!path.with_extension("pdf.tmp").exists());
    }
}
