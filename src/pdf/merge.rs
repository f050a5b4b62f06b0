//! Merging ordered PDF files into one using lopdf

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order their pages should appear
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge multiple PDF files into a single PDF, returning its page count
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use ticket_sheets::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("tickets-1-91.pdf"),
///         PathBuf::from("tickets-91-181.pdf"),
///     ],
///     output_path: PathBuf::from("tickets.pdf"),
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<usize> {
    if options.input_paths.is_empty() {
        return Err(Error::General("No input files provided".to_string()));
    }

    let documents = load_documents(&options.input_paths)?;
    let mut merged = assemble(documents);
    let page_count = merged.get_pages().len();

    merged.compress();
    merged.save(&options.output_path)?;

    debug!(
        "Merged {} files ({} pages) into {}",
        options.input_paths.len(),
        page_count,
        options.output_path.display()
    );

    Ok(page_count)
}

/// Load every input, rejecting missing files and documents without pages
fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    if let Some(missing) = paths.iter().find(|path| !path.exists()) {
        return Err(Error::FileNotFound(missing.clone()));
    }

    paths
        .iter()
        .map(|path| {
            let doc = Document::load(path)?;
            if doc.get_pages().is_empty() {
                return Err(Error::EmptyPdf(path.clone()));
            }
            Ok(doc)
        })
        .collect()
}

/// Combine documents into one whose page tree lists every page in input order
fn assemble(documents: Vec<Document>) -> Document {
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Renumber so object ids never clash across inputs
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // new_object_id() must hand out ids above everything just inserted
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let catalog_id = merged.new_object_id();

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    pages.set(
        "Kids",
        Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
    );

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged.objects.insert(pages_id, Object::Dictionary(pages));
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(page)) = merged.get_object_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    merged
}
