//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};

/// A finished conversion: the PDF plus what is known about how it was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The PDF bytes. Skipped in JSON output; write them with
    /// [`crate::convert_to_file`] or the CLI instead.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// Suggested file name for the download, e.g. `report_20250101_120000.pdf`.
    pub file_name: String,
    /// Structural facts collected while normalising.
    pub summary: DocumentSummary,
    /// Sizes and timings.
    pub stats: ConversionStats,
}

/// Facts about the normalised document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Title written into the PDF.
    pub title: Option<String>,
    /// `<p>` elements after sanitising.
    pub paragraphs: usize,
    /// `<h1>`…`<h6>` elements.
    pub headings: usize,
    /// `<table>` elements.
    pub tables: usize,
    /// Elements whose `style` attribute was set from the rule set.
    pub restyled_elements: usize,
    /// `<style>` blocks and stylesheet links removed (regex and DOM passes).
    pub removed_style_blocks: usize,
    /// Author `style` attributes discarded.
    pub discarded_inline_styles: usize,
    /// Parse errors the HTML parser repaired (unclosed or mis-nested tags).
    pub repaired_parse_errors: usize,
    /// Pages combined into the document (1 unless several fragments were given).
    pub pages: usize,
}

impl DocumentSummary {
    /// Fold the summary of a following page into this one. The first title
    /// found wins.
    pub fn absorb(&mut self, other: DocumentSummary) {
        if self.title.is_none() {
            self.title = other.title;
        }
        self.paragraphs += other.paragraphs;
        self.headings += other.headings;
        self.tables += other.tables;
        self.restyled_elements += other.restyled_elements;
        self.removed_style_blocks += other.removed_style_blocks;
        self.discarded_inline_styles += other.discarded_inline_styles;
        self.repaired_parse_errors += other.repaired_parse_errors;
        self.pages += other.pages;
    }
}

/// Sizes and timings for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Characters in the decoded input.
    pub input_chars: usize,
    /// Bytes in the final PDF.
    pub output_bytes: usize,
    /// Warnings reported by the rendering engine.
    pub renderer_warnings: usize,
    pub total_duration_ms: u64,
    pub normalize_duration_ms: u64,
    pub render_duration_ms: u64,
}

impl ConversionStats {
    /// Size reduction of output versus input, in percent. Negative when the
    /// PDF is larger than the HTML, which is the usual case for short inputs.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_chars == 0 {
            return 0.0;
        }
        (1.0 - self.output_bytes as f64 / self.input_chars as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_ratio_handles_growth_and_shrink() {
        let grow = ConversionStats {
            input_chars: 100,
            output_bytes: 300,
            ..Default::default()
        };
        assert!((grow.compression_ratio() + 200.0).abs() < 1e-9);

        let shrink = ConversionStats {
            input_chars: 1000,
            output_bytes: 250,
            ..Default::default()
        };
        assert!((shrink.compression_ratio() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn compression_ratio_of_empty_input_is_zero() {
        assert_eq!(ConversionStats::default().compression_ratio(), 0.0);
    }

    #[test]
    fn absorb_sums_counts_and_keeps_first_title() {
        let mut a = DocumentSummary {
            title: None,
            paragraphs: 2,
            pages: 1,
            ..Default::default()
        };
        a.absorb(DocumentSummary {
            title: Some("Second".into()),
            paragraphs: 3,
            tables: 1,
            pages: 1,
            ..Default::default()
        });
        a.absorb(DocumentSummary {
            title: Some("Third".into()),
            pages: 1,
            ..Default::default()
        });
        assert_eq!(a.title.as_deref(), Some("Second"));
        assert_eq!(a.paragraphs, 5);
        assert_eq!(a.tables, 1);
        assert_eq!(a.pages, 3);
    }

    #[test]
    fn output_json_omits_pdf_bytes() {
        let out = ConversionOutput {
            pdf: b"%PDF-1.3".to_vec(),
            file_name: "a.pdf".into(),
            summary: DocumentSummary::default(),
            stats: ConversionStats::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("pdf").is_none());
        assert_eq!(json["file_name"], "a.pdf");
    }
}
