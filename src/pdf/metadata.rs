//! PDF metadata extraction

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::error::{Error, Result};

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = load_with_pages(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| resolve_dict(&doc, info).ok());

    Ok(PdfMetadata {
        page_count,
        title: info.and_then(|dict| text_entry(dict, b"Title")),
        author: info.and_then(|dict| text_entry(dict, b"Author")),
    })
}

/// Count the number of pages in a PDF file
///
/// Reads the Count field of the root Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load_with_pages(path)?;
    count_pages_from_catalog(&doc)
}

fn load_with_pages(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    if count_pages_from_catalog(&doc)? == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }
    Ok(doc)
}

/// Count pages via the catalog's Pages dictionary
///
/// More reliable than get_pages(), which does not handle every nested page tree.
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let root = doc
        .trailer
        .get(b"Root")
        .map_err(|_| Error::General("No Root in trailer".to_string()))?;
    let catalog = resolve_dict(doc, root)?;

    let pages_ref = catalog
        .get(b"Pages")
        .map_err(|_| Error::General("No Pages in catalog".to_string()))?;
    let pages = resolve_dict(doc, pages_ref)?;

    match pages.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not a valid integer".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// Follow a reference (if any) to a dictionary
fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Dictionary> {
    let object = match object {
        Object::Reference(id) => doc.get_object(*id)?,
        other => other,
    };

    match object {
        Object::Dictionary(dict) => Ok(dict),
        _ => Err(Error::General("Expected a dictionary".to_string())),
    }
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }
}
