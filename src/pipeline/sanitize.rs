//! Sanitising: deterministic regex cleanup of raw HTML before parsing.
//!
//! Documents exported from word processors and scanned-book pipelines carry
//! spacing artefacts that survive any amount of CSS overriding: empty
//! paragraphs, runs of `<br>`, page counters such as `201/1975` left in the
//! flow, and fixed pixel widths that overflow a letter page. These are
//! removed here, on the raw text, before the DOM pass in
//! [`super::normalize`] takes over.
//!
//! ## Rule Order
//!
//! Style blocks go first so later rules never match inside CSS. Empty
//! paragraphs are removed before `<br>` runs are collapsed, and the
//! inter-tag whitespace pass runs last because earlier rules match on
//! `<p>\s*…` shapes that it would otherwise collapse.

use once_cell::sync::Lazy;
use regex::Regex;

/// What the sanitiser removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub style_blocks: usize,
    pub empty_paragraphs: usize,
    pub page_numbers: usize,
}

/// Apply all sanitising rules to raw HTML.
///
/// Rules (applied in order):
/// 1. Remove `<style>…</style>` blocks
/// 2. Remove empty paragraphs (`<p> </p>`, `<p>&nbsp;</p>`)
/// 3. Collapse runs of `<br>` to one
/// 4. Drop a `<br>` that opens a paragraph
/// 5. Remove standalone page-number paragraphs (`<p>201/1975</p>`)
/// 6. Replace numeric `width` attributes with `100%`, drop numeric `height`
/// 7. Remove whitespace between tags
pub fn sanitize_html(input: &str) -> (String, SanitizeReport) {
    let mut report = SanitizeReport::default();

    let (s, n) = strip_style_blocks(input);
    report.style_blocks = n;
    let (s, n) = remove_empty_paragraphs(&s);
    report.empty_paragraphs = n;
    let s = collapse_line_breaks(&s);
    let s = trim_leading_paragraph_breaks(&s);
    let (s, n) = remove_page_number_paragraphs(&s);
    report.page_numbers = n;
    let s = relax_fixed_dimensions(&s);
    let s = collapse_inter_tag_whitespace(&s);

    (s, report)
}

// ── Rule 1: Style blocks ─────────────────────────────────────────────────────

static RE_STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());

fn strip_style_blocks(input: &str) -> (String, usize) {
    let count = RE_STYLE_BLOCK.find_iter(input).count();
    (RE_STYLE_BLOCK.replace_all(input, "").into_owned(), count)
}

// ── Rule 2: Empty paragraphs ─────────────────────────────────────────────────

static RE_EMPTY_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p>(?:\s|&nbsp;|&#160;)*</p>").unwrap());

fn remove_empty_paragraphs(input: &str) -> (String, usize) {
    let count = RE_EMPTY_PARAGRAPH.find_iter(input).count();
    (RE_EMPTY_PARAGRAPH.replace_all(input, "").into_owned(), count)
}

// ── Rule 3: Runs of <br> ─────────────────────────────────────────────────────

static RE_BR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){2,}").unwrap());

fn collapse_line_breaks(input: &str) -> String {
    RE_BR_RUN.replace_all(input, "<br>").into_owned()
}

// ── Rule 4: <br> opening a paragraph ─────────────────────────────────────────

static RE_PARAGRAPH_LEADING_BR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p>\s*<br\s*/?>\s*").unwrap());

fn trim_leading_paragraph_breaks(input: &str) -> String {
    RE_PARAGRAPH_LEADING_BR.replace_all(input, "<p>").into_owned()
}

// ── Rule 5: Page-number paragraphs ───────────────────────────────────────────

static RE_PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p>\s*\d+\s*/\s*\d+\s*</p>").unwrap());

fn remove_page_number_paragraphs(input: &str) -> (String, usize) {
    let count = RE_PAGE_NUMBER.find_iter(input).count();
    (RE_PAGE_NUMBER.replace_all(input, "").into_owned(), count)
}

// ── Rule 6: Fixed dimensions ─────────────────────────────────────────────────
//
// Word-processor exports pin tables and images to the pixel width of the
// author's screen. On a letter page those overflow, so numeric widths become
// 100% and numeric heights go away entirely. Percentages are left alone.

static RE_NUMERIC_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bwidth\s*=\s*"[\d.]+(?:px)?""#).unwrap());
static RE_NUMERIC_HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\s\bheight\s*=\s*"[\d.]+(?:px)?""#).unwrap());

fn relax_fixed_dimensions(input: &str) -> String {
    let s = RE_NUMERIC_WIDTH.replace_all(input, r#"width="100%""#);
    RE_NUMERIC_HEIGHT.replace_all(&s, "").into_owned()
}

// ── Rule 7: Whitespace between tags ──────────────────────────────────────────

static RE_INTER_TAG_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());

fn collapse_inter_tag_whitespace(input: &str) -> String {
    RE_INTER_TAG_WS.replace_all(input, "><").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_style_blocks() {
        let input = "<head><STYLE type=\"text/css\">\np { margin: 40px }\n</STYLE></head><p>x</p>";
        let (out, n) = strip_style_blocks(input);
        assert_eq!(out, "<head></head><p>x</p>");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_strip_multiple_style_blocks() {
        let input = "<style>a{}</style><p>1</p><style media=\"print\">b{}</style>";
        let (out, n) = strip_style_blocks(input);
        assert_eq!(out, "<p>1</p>");
        assert_eq!(n, 2);
    }

    #[test]
    fn test_remove_empty_paragraphs() {
        let (out, n) = remove_empty_paragraphs("<p>  </p><p>&nbsp;</p><p>keep</p><p>\n</p>");
        assert_eq!(out, "<p>keep</p>");
        assert_eq!(n, 3);
    }

    #[test]
    fn test_collapse_line_breaks() {
        assert_eq!(collapse_line_breaks("a<br><br/> <BR />b"), "a<br>b");
        assert_eq!(collapse_line_breaks("a<br>b"), "a<br>b");
    }

    #[test]
    fn test_trim_leading_paragraph_breaks() {
        assert_eq!(trim_leading_paragraph_breaks("<p> <br/> text</p>"), "<p>text</p>");
    }

    #[test]
    fn test_remove_page_numbers() {
        let (out, n) = remove_page_number_paragraphs("<p>Intro</p><p> 201/1975 </p><p>1/2 cup</p>");
        assert_eq!(out, "<p>Intro</p><p>1/2 cup</p>");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_relax_fixed_dimensions() {
        let out = relax_fixed_dimensions(r#"<table width="812" height="40"><td width="50%">"#);
        assert_eq!(out, r#"<table width="100%"><td width="50%">"#);
    }

    #[test]
    fn test_line_height_attribute_is_not_height() {
        let out = relax_fixed_dimensions(r#"<img data-line-height="3">"#);
        assert_eq!(out, r#"<img data-line-height="3">"#);
    }

    #[test]
    fn test_collapse_inter_tag_whitespace() {
        assert_eq!(
            collapse_inter_tag_whitespace("<ul>\n  <li>a</li>\n</ul>"),
            "<ul><li>a</li></ul>"
        );
    }

    #[test]
    fn test_sanitize_full_pipeline() {
        let input = "<html><head><style>p{line-height:3}</style></head>\n<body>\n\
                     <p> </p>\n<p><br><br>Hello</p>\n<p>3/10</p>\n</body></html>";
        let (out, report) = sanitize_html(input);
        assert!(!out.to_lowercase().contains("<style"));
        assert!(out.contains("<p>Hello</p>"), "got: {out}");
        assert!(!out.contains("3/10"));
        assert_eq!(
            report,
            SanitizeReport {
                style_blocks: 1,
                empty_paragraphs: 1,
                page_numbers: 1,
            }
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let input = "<p>a</p>\n<br><br>\n<p>  </p><table width=\"600\"><tr><td>x</td></tr></table>";
        let (once, _) = sanitize_html(input);
        let (twice, _) = sanitize_html(&once);
        assert_eq!(once, twice);
    }
}
