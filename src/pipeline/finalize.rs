//! Finalisation: make the rendered PDF reproducible.
//!
//! The renderer stamps every file with the wall-clock time and a random
//! document identifier, so two runs over the same input never match byte
//! for byte. This stage rewrites the file with lopdf:
//!
//! - `CreationDate`, `ModDate` and `Identifier` are dropped from the info
//!   dictionary and the title is set to the resolved document title;
//! - the XMP metadata stream is detached from the catalog and pruned;
//! - the trailer `ID` is replaced with a SHA-256 digest of the scrubbed file.
//!
//! The result depends only on the normalised document and the page profile.

use crate::error::Html2PdfError;
use lopdf::{Document, Object, StringFormat};
use sha2::{Digest, Sha256};
use tracing::debug;

const PRODUCER: &str = concat!("html2pdf ", env!("CARGO_PKG_VERSION"));

/// Scrub run-dependent metadata from `pdf` and return the rewritten bytes.
pub fn finalize_pdf(pdf: &[u8], title: &str) -> Result<Vec<u8>, Html2PdfError> {
    let mut doc = Document::load_mem(pdf).map_err(lopdf_failure)?;

    scrub_info(&mut doc, title)?;
    let pruned = detach_metadata(&mut doc)?;
    if pruned > 0 {
        debug!("Pruned {} unreferenced objects", pruned);
    }

    // The digest is taken over the file with a zeroed identifier so that the
    // identifier itself never feeds into it.
    set_file_id(&mut doc, &[0u8; 16]);
    let scrubbed = save(&mut doc)?;
    let digest = Sha256::digest(&scrubbed);
    set_file_id(&mut doc, &digest[..16]);

    save(&mut doc)
}

fn scrub_info(doc: &mut Document, title: &str) -> Result<(), Html2PdfError> {
    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => {
            let id = doc.add_object(lopdf::Dictionary::new());
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let info = doc
        .get_object_mut(info_id)
        .and_then(Object::as_dict_mut)
        .map_err(lopdf_failure)?;
    info.remove(b"CreationDate");
    info.remove(b"ModDate");
    info.remove(b"Identifier");
    info.set("Title", text_string(title));
    info.set(
        "Producer",
        Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
    );
    Ok(())
}

/// Encode an info-dictionary text string. ASCII is written as is; anything
/// else becomes UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Remove the catalog's `Metadata` entry. Returns the number of objects
/// pruned afterwards.
fn detach_metadata(doc: &mut Document) -> Result<usize, Html2PdfError> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(lopdf_failure)?;
    let catalog = doc
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(lopdf_failure)?;

    if catalog.remove(b"Metadata").is_none() {
        return Ok(0);
    }
    Ok(doc.prune_objects().len())
}

fn set_file_id(doc: &mut Document, id: &[u8]) {
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.to_vec(), StringFormat::Hexadecimal),
            Object::String(id.to_vec(), StringFormat::Hexadecimal),
        ]),
    );
}

fn save(doc: &mut Document) -> Result<Vec<u8>, Html2PdfError> {
    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| Html2PdfError::RenderingFailed {
        detail: format!("could not write finalised PDF: {e}"),
    })?;
    Ok(out)
}

fn lopdf_failure(e: lopdf::Error) -> Html2PdfError {
    Html2PdfError::RenderingFailed {
        detail: format!("renderer output is not a readable PDF: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// A one-page PDF carrying the same run-dependent fields the renderer
    /// writes.
    fn stamped_pdf(stamp: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let metadata_id = doc.add_object(lopdf::Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            format!("<x:xmpmeta>{stamp}</x:xmpmeta>").into_bytes(),
        ));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Metadata" => metadata_id,
        });
        let info_id = doc.add_object(dictionary! {
            "CreationDate" => Object::string_literal(format!("D:{stamp}")),
            "ModDate" => Object::string_literal(format!("D:{stamp}")),
            "Identifier" => Object::string_literal(stamp),
            "Title" => Object::string_literal(""),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::string_literal(stamp),
                Object::string_literal(stamp),
            ]),
        );
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn run_dependent_fields_do_not_affect_output() {
        let a = finalize_pdf(&stamped_pdf("20240101120000"), "Report").unwrap();
        let b = finalize_pdf(&stamped_pdf("20251231235959"), "Report").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn info_dictionary_is_scrubbed() {
        let out = finalize_pdf(&stamped_pdf("20240101120000"), "Annual Report").unwrap();
        let doc = Document::load_mem(&out).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.get(b"CreationDate").is_err());
        assert!(info.get(b"ModDate").is_err());
        assert!(info.get(b"Identifier").is_err());
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Annual Report");

        let catalog = doc.catalog().unwrap();
        assert!(catalog.get(b"Metadata").is_err());
    }

    #[test]
    fn non_ascii_title_is_utf16_with_bom() {
        let out = finalize_pdf(&stamped_pdf("1"), "Café").unwrap();
        let doc = Document::load_mem(&out).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(
            info.get(b"Title").unwrap().as_str().unwrap(),
            [0xFE, 0xFF, 0x00, b'C', 0x00, b'a', 0x00, b'f', 0x00, 0xE9]
        );
    }

    #[test]
    fn file_id_tracks_content() {
        let a = finalize_pdf(&stamped_pdf("1"), "One").unwrap();
        let b = finalize_pdf(&stamped_pdf("1"), "Two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_is_a_rendering_failure() {
        let err = finalize_pdf(b"not a pdf", "x").unwrap_err();
        assert!(matches!(err, Html2PdfError::RenderingFailed { .. }));
    }
}
