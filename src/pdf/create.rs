//! Single blank page PDFs

use std::path::Path;

use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::Result;
use crate::layout::PaperFormat;

/// Write a one-page PDF of the given paper size with an empty content stream
///
/// `title` is stored in the document Info dictionary, which makes pages
/// distinguishable after a merge.
pub fn write_blank_page(path: &Path, paper: PaperFormat, title: &str) -> Result<()> {
    let dims = paper.dimensions();
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(dims.width.pt() as f32),
            Object::Real(dims.height.pt() as f32),
        ]),
    );
    let page_id = doc.add_object(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));

    let mut info = Dictionary::new();
    info.set("Title", Object::string_literal(title));
    let info_id = doc.add_object(Object::Dictionary(info));

    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::extract_metadata;
    use tempfile::TempDir;

    #[test]
    fn test_blank_page_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.pdf");

        write_blank_page(&path, PaperFormat::Letter, "page 30").unwrap();

        let metadata = extract_metadata(&path).unwrap();
        assert_eq!(metadata.page_count, 1);
        assert_eq!(metadata.title.as_deref(), Some("page 30"));
    }
}
