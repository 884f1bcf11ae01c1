//! The fixed formatting rule set.
//!
//! Every document gets the same typography regardless of what its author
//! wrote: 11pt Arial at 1.6 line height, tight paragraph margins, a fixed
//! heading scale and bordered tables. The rules are compiled in and cannot
//! be changed at run time.

use serde::Serialize;

const BODY: &str = "font-family: Arial, sans-serif; font-size: 11pt; line-height: 1.6; padding: 0";
const PARAGRAPH: &str =
    "font-family: Arial, sans-serif; font-size: 11pt; line-height: 1.6; margin: 0.4em 0; padding: 0";
const H1: &str =
    "font-family: Arial, sans-serif; font-size: 18pt; line-height: 1.4; margin: 0.6em 0 0.3em 0";
const H2: &str =
    "font-family: Arial, sans-serif; font-size: 15pt; line-height: 1.4; margin: 0.6em 0 0.3em 0";
const H3: &str =
    "font-family: Arial, sans-serif; font-size: 13pt; line-height: 1.4; margin: 0.6em 0 0.3em 0";
const H4: &str =
    "font-family: Arial, sans-serif; font-size: 12pt; line-height: 1.4; margin: 0.6em 0 0.3em 0";
const H5: &str =
    "font-family: Arial, sans-serif; font-size: 11pt; line-height: 1.4; margin: 0.6em 0 0.3em 0";
const H6: &str =
    "font-family: Arial, sans-serif; font-size: 10pt; line-height: 1.4; margin: 0.6em 0 0.3em 0";
const TABLE: &str =
    "border-collapse: collapse; width: 100%; margin: 0.5em 0; font-size: 11pt; table-layout: fixed";
const DATA_CELL: &str = "border: 1px solid #ddd; padding: 6px; text-align: left; \
                         vertical-align: top; line-height: 1.6";
const HEADER_CELL: &str = "border: 1px solid #ddd; padding: 6px; text-align: left; \
                           vertical-align: top; line-height: 1.6; \
                           background-color: #f2f2f2; font-weight: bold";
const PRE: &str = "white-space: pre-wrap; background-color: #f0f0f0; padding: 6px; \
                   margin: 0.4em 0; line-height: 1.6";
const CODE: &str = "background-color: #f0f0f0; padding: 3px 5px";
const PAGE: &str = "page-break-after: always; margin: 0; padding: 0";
const LAST_PAGE: &str = "page-break-after: auto; margin: 0; padding: 0";

/// Element categories the rule set has an entry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    Body,
    Paragraph,
    /// Heading level 1–6.
    Heading(u8),
    Table,
    HeaderCell,
    DataCell,
    Preformatted,
    Code,
    /// Page wrapper `<div>`; `last` suppresses the trailing page break.
    Page { last: bool },
}

impl ElementKind {
    /// Map an HTML tag name to its category. `body` and page wrappers are
    /// produced by the document template, not by tag lookup.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "p" => ElementKind::Paragraph,
            "h1" => ElementKind::Heading(1),
            "h2" => ElementKind::Heading(2),
            "h3" => ElementKind::Heading(3),
            "h4" => ElementKind::Heading(4),
            "h5" => ElementKind::Heading(5),
            "h6" => ElementKind::Heading(6),
            "table" => ElementKind::Table,
            "th" => ElementKind::HeaderCell,
            "td" => ElementKind::DataCell,
            "pre" => ElementKind::Preformatted,
            "code" => ElementKind::Code,
            _ => return None,
        };
        Some(kind)
    }
}

/// Sanctioned inline style for an element category. The body entry carries
/// no margin; see [`body_style`].
pub fn style_for(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Body => BODY,
        ElementKind::Paragraph => PARAGRAPH,
        ElementKind::Heading(1) => H1,
        ElementKind::Heading(2) => H2,
        ElementKind::Heading(3) => H3,
        ElementKind::Heading(4) => H4,
        ElementKind::Heading(5) => H5,
        ElementKind::Heading(_) => H6,
        ElementKind::Table => TABLE,
        ElementKind::HeaderCell => HEADER_CELL,
        ElementKind::DataCell => DATA_CELL,
        ElementKind::Preformatted => PRE,
        ElementKind::Code => CODE,
        ElementKind::Page { last: false } => PAGE,
        ElementKind::Page { last: true } => LAST_PAGE,
    }
}

/// Body style including the page margin, e.g. `…; margin: 1cm`.
pub fn body_style(css_margin: &str) -> String {
    format!("{BODY}; margin: {css_margin}")
}

/// Whether `style` is exactly one of the sanctioned declarations.
pub fn is_sanctioned(style: &str) -> bool {
    const ALL: [&str; 15] = [
        BODY, PARAGRAPH, H1, H2, H3, H4, H5, H6, TABLE, DATA_CELL, HEADER_CELL, PRE, CODE, PAGE,
        LAST_PAGE,
    ];
    ALL.contains(&style)
        || style
            .strip_prefix(BODY)
            .is_some_and(|rest| rest.starts_with("; margin: "))
}
