//! # html2pdf
//!
//! Convert HTML documents to PDF with one fixed, consistent look.
//!
//! ## Why this crate?
//!
//! HTML exported from word processors, wikis and e-book pipelines prints
//! badly: every document brings its own fonts, pixel-sized margins, empty
//! paragraphs and stray page counters. This crate throws the author's
//! styling away and applies a single compiled-in rule set (11pt Arial at
//! 1.6 line height, a fixed heading scale, bordered tables, 1 cm margins on
//! US Letter) before handing the document to the renderer. Two documents
//! converted with this crate look like they came from the same printer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML
//!  │
//!  ├─ 1. Input      read local file, upload bytes or download from URL
//!  ├─ 2. Sanitize   7 regex rules (style blocks, empty <p>, <br> runs, …)
//!  ├─ 3. Normalize  html5ever DOM pass: drop author styles, apply rule set
//!  ├─ 4. Template   letter page, margin on <body>, optional page wrappers
//!  ├─ 5. Render     printpdf layout (CPU-bound, spawn_blocking)
//!  └─ 6. Finalize   strip timestamps, content-derived ID → reproducible bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2pdf::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().add_timestamp(false).build()?;
//!     let output = convert_to_file("report.html", "report.pdf", &config).await?;
//!     eprintln!(
//!         "{} chars → {} bytes ({:.1}% reduction)",
//!         output.stats.input_chars,
//!         output.stats.output_bytes,
//!         output.stats.compression_ratio()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2pdf` binary (clap, anyhow, tracing-subscriber, indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! html2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConversionSettings, PageProfile, Settings,
};
pub use convert::{
    convert, convert_bytes, convert_pages, convert_sync, convert_to_file, inspect,
    output_file_name, write_pdf,
};
pub use error::{ErrorCategory, Html2PdfError};
pub use output::{ConversionOutput, ConversionStats, DocumentSummary};
pub use pipeline::normalize::NormalizedDocument;
pub use progress::{
    ConversionProgressCallback, ConversionStage, NoopProgressCallback, ProgressCallback,
};
