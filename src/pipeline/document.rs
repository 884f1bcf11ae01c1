//! Document template: wrap normalised body markup into the page the
//! renderer lays out.
//!
//! The template carries no `<style>` element. Typography lives on the
//! elements themselves (see [`super::rules`]) and the page margin on
//! `<body>`, so the renderer sees nothing but sanctioned inline styles.

use crate::config::PageProfile;
use crate::pipeline::rules::{body_style, style_for, ElementKind};

/// Build the full HTML document for a single body.
pub fn build_document(title: &str, body: &str, page: &PageProfile) -> String {
    wrap(title, body, page)
}

/// Build one HTML document from several bodies, each on its own page.
///
/// Every page is wrapped in a `<div>` that forces a break after it, except
/// the last one.
pub fn build_paged_document(title: &str, bodies: &[String], page: &PageProfile) -> String {
    let last = bodies.len().saturating_sub(1);
    let combined: String = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            format!(
                r#"<div class="page" style="{}">{}</div>"#,
                style_for(ElementKind::Page { last: i == last }),
                body
            )
        })
        .collect();
    wrap(title, &combined, page)
}

fn wrap(title: &str, body: &str, page: &PageProfile) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n</head>\n\
         <body style=\"{}\">{}</body>\n</html>\n",
        escape_text(title),
        body_style(&page.css_margin()),
        body
    )
}

/// Escape text for use inside an element.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
