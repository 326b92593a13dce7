//! PDF outline entries for report sections, written with `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use thiserror::Error;

use crate::report::SectionPlacement;

/// Errors raised while adding an outline to a rendered report.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("failed to parse rendered PDF: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("failed to write PDF outline: {0}")]
    Write(#[from] std::io::Error),

    #[error("PDF catalog entry is missing")]
    MissingCatalog,

    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,

    #[error("section '{title}' refers to missing page {page}")]
    MissingPage { title: String, page: usize },
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

/// Adds one top-level outline entry per section, pointing at the page the section starts on.
///
/// Returns the input unchanged when there are no sections.
pub fn apply_section_bookmarks(
    pdf_bytes: &[u8],
    sections: &[SectionPlacement],
) -> Result<Vec<u8>, BookmarkError> {
    if sections.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let entries = collect_entries(&mut document, sections, &pages)?;

    let outlines_id = document.new_object_id();
    link_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

fn collect_entries(
    document: &mut Document,
    sections: &[SectionPlacement],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry>, BookmarkError> {
    sections
        .iter()
        .map(|section| {
            let page_ref = u32::try_from(section.page)
                .ok()
                .and_then(|page| pages.get(&page).copied())
                .ok_or_else(|| BookmarkError::MissingPage {
                    title: section.title.clone(),
                    page: section.page,
                })?;
            Ok(OutlineEntry {
                object_id: document.new_object_id(),
                page_ref,
                title: section.title.clone(),
            })
        })
        .collect()
}

/// Outline titles are text strings: plain literals when ASCII, UTF-16BE otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn link_entries(outlines_id: ObjectId, document: &mut Document, entries: &[OutlineEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", text_string(&entry.title));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name(b"Fit".to_vec()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        if let Some(previous) = index.checked_sub(1).map(|i| &entries[i]) {
            dictionary.set("Prev", Object::Reference(previous.object_id));
        }
        if let Some(next) = entries.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }
        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut outlines = Dictionary::new();
    outlines.set("Type", Object::Name(b"Outlines".to_vec()));
    outlines.set("Count", Object::Integer(entries.len() as i64));
    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        outlines.set("First", Object::Reference(first.object_id));
        outlines.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(outlines));

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::fonts::FontSource;
    use crate::pdf::PdfSurface;
    use crate::surface::Surface;

    fn two_page_pdf() -> Vec<u8> {
        let mut surface = PdfSurface::new("Test", &ReportConfig::default(), &FontSource::Builtin)
            .expect("document");
        surface.text("1. Données d'entrée", 20.0, 68.0);
        surface.add_page();
        surface.text("4. Topologies", 20.0, 30.0);
        surface.finish().expect("serialised")
    }

    fn placement(title: &str, page: usize) -> SectionPlacement {
        SectionPlacement {
            title: title.to_owned(),
            page,
            top: 20.0,
            bottom: 60.0,
            rows: 2,
        }
    }

    #[test]
    fn outline_lists_every_section() {
        let sections = vec![
            placement("1. Données d'entrée", 1),
            placement("4. Topologies", 2),
        ];
        let bytes = apply_section_bookmarks(&two_page_pdf(), &sections).expect("bookmarks");

        let document = Document::load_mem(&bytes).expect("reload");
        let catalog = document.catalog().expect("catalog");
        let outlines_id = catalog
            .get(b"Outlines")
            .and_then(Object::as_reference)
            .expect("outlines reference");
        let outlines = document
            .get_object(outlines_id)
            .and_then(Object::as_dict)
            .expect("outlines dictionary");
        assert_eq!(
            outlines.get(b"Count").and_then(Object::as_i64).expect("count"),
            2
        );
    }

    #[test]
    fn missing_page_is_an_error() {
        let err = apply_section_bookmarks(&two_page_pdf(), &[placement("3. Équipements", 7)])
            .unwrap_err();
        assert!(matches!(err, BookmarkError::MissingPage { page: 7, .. }));
    }

    #[test]
    fn non_ascii_titles_are_utf16() {
        let Object::String(bytes, StringFormat::Hexadecimal) = text_string("Équipements") else {
            panic!("expected a hexadecimal string");
        };
        assert_eq!(&bytes[..4], &[0xFE, 0xFF, 0x00, 0xC9]);
        assert!(matches!(text_string("Topologies"), Object::String(_, StringFormat::Literal)));
    }
}
