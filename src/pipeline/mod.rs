//! Pipeline stages for HTML-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap the rendering backend without touching the normaliser.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ sanitize ──▶ normalize ──▶ document ──▶ render ──▶ finalize
//! (path/URL) (regex)     (html5ever)   (template)   (printpdf)  (lopdf)
//! ```
//!
//! 1. [`input`]: read, download or accept bytes; decode and reject
//!    empty or binary input
//! 2. [`sanitize`]: deterministic regex cleanup of the raw markup
//! 3. [`normalize`]: parse, drop author styling, apply [`rules`]
//! 4. [`document`]: wrap the body in the letter-page template
//! 5. [`render`]: lay out with printpdf; runs in `spawn_blocking`
//!    because layout is CPU-bound
//! 6. [`finalize`]: remove run-dependent metadata so output is reproducible

pub mod document;
pub mod finalize;
pub mod input;
pub mod normalize;
pub mod render;
pub mod rules;
pub mod sanitize;
