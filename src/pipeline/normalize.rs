//! Normalisation: a DOM pass that replaces author styling with the fixed
//! rule set.
//!
//! The sanitised markup is parsed with html5ever, which repairs unclosed and
//! mis-nested tags the way a browser would. The tree is then walked once:
//!
//! - `<style>`, `<script>` and `<link rel="stylesheet">` elements are removed;
//! - every `style` attribute is discarded;
//! - elements the rule set knows (`p`, `h1`–`h6`, `table`, `th`, `td`,
//!   `pre`, `code`) get their sanctioned style.
//!
//! Table structure, including `colspan` and `rowspan`, is left as parsed.
//! Only the children of `<body>` are serialised back; the document template
//! in [`super::document`] supplies the head and body.

use crate::error::Html2PdfError;
use crate::output::DocumentSummary;
use crate::pipeline::rules::{style_for, ElementKind};
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use serde::Serialize;
use tracing::debug;

/// Body markup after normalisation, plus what was learned along the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedDocument {
    /// Serialised children of `<body>`.
    pub body: String,
    pub summary: DocumentSummary,
}

/// Parse `html`, apply the rule set and serialise the body.
pub fn normalize_html(html: &str) -> Result<NormalizedDocument, Html2PdfError> {
    let dom = parse(html);
    let mut summary = DocumentSummary {
        repaired_parse_errors: dom.errors.len(),
        pages: 1,
        ..Default::default()
    };
    if summary.repaired_parse_errors > 0 {
        debug!(
            "html5ever repaired {} parse errors",
            summary.repaired_parse_errors
        );
    }

    restyle_tree(&dom.document, &mut summary);

    let body = match find_element(&dom.document, "body") {
        Some(body) => serialize_children(body)?,
        None => String::new(),
    };

    Ok(NormalizedDocument { body, summary })
}

/// Parse as a full document. A missing doctype would put the parser in
/// quirks mode and count as a repair, so one is supplied.
fn parse(html: &str) -> RcDom {
    let has_doctype = html
        .trim_start()
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    let source = if has_doctype {
        html.to_string()
    } else {
        format!("<!DOCTYPE html>{html}")
    };
    parse_document(RcDom::default(), Default::default()).one(source)
}

/// Walk the tree iteratively, removing style carriers and rewriting
/// `style` attributes.
fn restyle_tree(root: &Handle, summary: &mut DocumentSummary) {
    let mut stack: Vec<Handle> = vec![root.clone()];

    while let Some(node) = stack.pop() {
        {
            let mut children = node.children.borrow_mut();
            let before = children.len();
            children.retain(|child| !is_removable(child, summary));
            if children.len() != before {
                debug!("Removed {} style/script elements", before - children.len());
            }
        }

        if let NodeData::Element {
            ref name,
            ref attrs,
            ..
        } = node.data
        {
            let tag = name.local.as_ref().to_ascii_lowercase();
            let mut attrs = attrs.borrow_mut();

            let before = attrs.len();
            attrs.retain(|a| !a.name.local.as_ref().eq_ignore_ascii_case("style"));
            summary.discarded_inline_styles += before - attrs.len();

            if let Some(kind) = ElementKind::from_tag(&tag) {
                attrs.push(style_attribute(style_for(kind)));
                summary.restyled_elements += 1;
                match kind {
                    ElementKind::Paragraph => summary.paragraphs += 1,
                    ElementKind::Heading(_) => summary.headings += 1,
                    ElementKind::Table => summary.tables += 1,
                    _ => {}
                }
            }

            if tag == "title" && summary.title.is_none() {
                let text = text_content(&node);
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !text.is_empty() {
                    summary.title = Some(text);
                }
            }
        }

        // Push in reverse so siblings are visited in document order.
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
}

/// Elements that carry styling or executable content and are dropped whole.
fn is_removable(node: &Handle, summary: &mut DocumentSummary) -> bool {
    let NodeData::Element {
        ref name,
        ref attrs,
        ..
    } = node.data
    else {
        return false;
    };

    match name.local.as_ref().to_ascii_lowercase().as_str() {
        "style" => {
            summary.removed_style_blocks += 1;
            true
        }
        "link" => {
            let is_stylesheet = attrs.borrow().iter().any(|a| {
                a.name.local.as_ref().eq_ignore_ascii_case("rel")
                    && a.value
                        .split_ascii_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("stylesheet"))
            });
            if is_stylesheet {
                summary.removed_style_blocks += 1;
            }
            is_stylesheet
        }
        "script" | "noscript" => true,
        _ => false,
    }
}

fn style_attribute(value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from("style")),
        value: value.into(),
    }
}

/// Concatenated text of all descendants.
fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    let mut stack = vec![node.clone()];
    while let Some(n) = stack.pop() {
        if let NodeData::Text { ref contents } = n.data {
            out.push_str(&contents.borrow());
        }
        for child in n.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    out
}

/// First element named `tag` in document order.
fn find_element(root: &Handle, tag: &str) -> Option<Handle> {
    let mut stack = vec![root.clone()];
    while let Some(n) = stack.pop() {
        if let NodeData::Element { ref name, .. } = n.data {
            if name.local.as_ref().eq_ignore_ascii_case(tag) {
                return Some(n);
            }
        }
        for child in n.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    None
}

fn serialize_children(node: Handle) -> Result<String, Html2PdfError> {
    let mut out = Vec::new();
    let handle: SerializableHandle = node.into();
    serialize(
        &mut out,
        &handle,
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )
    .map_err(|e| Html2PdfError::Internal(format!("HTML serialisation failed: {e}")))?;
    String::from_utf8(out)
        .map_err(|e| {
            Html2PdfError::Internal(format!("HTML serialisation produced invalid UTF-8: {e}"))
        })
}
