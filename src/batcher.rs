//! Paginating label markup into temp files
//!
//! Pages are written as `chunks-temp-<last index>.txt`. The suffix is the absolute
//! index of the last item on the page, never a batch-local counter, so a directory
//! scan can always put pages back in item order.

use std::ops::Range;
use std::path::{Path, PathBuf};

use glob::glob;
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::item::ItemSource;
use crate::progress::Progress;

/// Default number of labels per page
pub const DEFAULT_PAGE_SIZE: usize = 30;

const PAGE_PREFIX: &str = "chunks-temp-";
const PAGE_EXTENSION: &str = "txt";

/// Sort key of a page: the absolute index of its last item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey {
    pub last_index: u64,
}

impl PageKey {
    pub fn new(last_index: u64) -> Self {
        Self { last_index }
    }

    /// File name this page is stored under
    pub fn file_name(&self) -> String {
        format!("{}{}.{}", PAGE_PREFIX, self.last_index, PAGE_EXTENSION)
    }

    /// Recover the key from a page file name
    ///
    /// The suffix is compared as a number, so `-9` orders before `-10`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let suffix = stem.rsplit('-').next()?;
        suffix.parse().ok().map(Self::new)
    }
}

/// A page of label markup on temp storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub key: PageKey,
    pub path: PathBuf,
    /// Labels on the page; recovered pages count as one
    pub items: u64,
}

/// Glob matching every page file in `dir`
pub fn page_pattern(dir: &Path) -> String {
    dir.join(format!("{}*.{}", PAGE_PREFIX, PAGE_EXTENSION))
        .display()
        .to_string()
}

/// Find page files matching `pattern`, ordered by their numeric key
///
/// Files whose names carry no numeric suffix are skipped with a warning.
pub fn scan_pages(pattern: &str) -> Result<Vec<PageFile>> {
    let entries = glob(pattern).map_err(|e| Error::InvalidGlob(format!("{}: {}", pattern, e)))?;

    let mut pages = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        match PageKey::from_path(&path) {
            Some(key) => pages.push(PageFile { key, path, items: 1 }),
            None => warn!("Skipping {}: no page number in file name", path.display()),
        }
    }

    sort_pages(&mut pages);
    Ok(pages)
}

/// Order pages by ascending key
pub fn sort_pages(pages: &mut [PageFile]) {
    pages.sort_by_key(|page| page.key);
}

/// Writes label markup for a range of items as page files
pub struct TemplateBatcher {
    temp_dir: PathBuf,
    page_size: usize,
}

impl TemplateBatcher {
    pub fn new(temp_dir: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            page_size: page_size.max(1),
        }
    }

    /// Write pages for the half-open item range `range`
    ///
    /// A page is flushed when the item index is a multiple of the page size, and the
    /// trailing partial page is flushed when the range ends. At most one page of
    /// markup is held in memory. Indices the source cannot produce are skipped.
    pub fn write_range(
        &self,
        range: Range<u64>,
        source: &dyn ItemSource,
        progress: &mut Progress,
    ) -> Result<Vec<PageFile>> {
        info!("Creating text templates for items {}..{}", range.start, range.end);

        let mut pages = Vec::new();
        let mut buffer = String::new();
        let mut buffered = 0u64;
        let mut last_index = None;

        for index in range {
            match source.item(index) {
                Some(item) => {
                    buffer.push_str(&item.markup());
                    buffered += 1;
                    last_index = Some(index);
                }
                None => debug!("No item at index {}, skipping", index),
            }

            if index % self.page_size as u64 == 0 {
                if let Some(last) = last_index.take() {
                    pages.push(self.flush(last, &buffer, buffered)?);
                    buffer.clear();
                    buffered = 0;
                }
            }

            progress.tick();
        }

        if let Some(last) = last_index {
            pages.push(self.flush(last, &buffer, buffered)?);
        }

        Ok(pages)
    }

    fn flush(&self, last_index: u64, markup: &str, items: u64) -> Result<PageFile> {
        let key = PageKey::new(last_index);
        let path = self.temp_dir.join(key.file_name());
        std::fs::write(&path, markup)?;
        debug!("Wrote {} labels to {}", items, path.display());

        Ok(PageFile { key, path, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{BarcodeSpec, InventoryItems};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn source(count: u64) -> InventoryItems {
        InventoryItems {
            inventory: "F-100".to_string(),
            lot: "61208".to_string(),
            expiry: NaiveDate::from_ymd_opt(2022, 6, 30).unwrap(),
            count,
            barcode: BarcodeSpec::default(),
            logo: None,
        }
    }

    fn labels_in(path: &Path) -> Vec<u64> {
        let content = std::fs::read_to_string(path).unwrap();
        content
            .split("data-index=\"")
            .skip(1)
            .map(|rest| rest.split('"').next().unwrap().parse().unwrap())
            .collect()
    }

    #[test]
    fn test_full_pages() {
        let dir = TempDir::new().unwrap();
        let batcher = TemplateBatcher::new(dir.path(), 30);
        let mut progress = Progress::hidden(90);

        let pages = batcher.write_range(1..91, &source(300), &mut progress).unwrap();

        let keys: Vec<u64> = pages.iter().map(|p| p.key.last_index).collect();
        assert_eq!(keys, vec![30, 60, 90]);
        assert!(pages.iter().all(|p| p.items == 30));
        assert_eq!(progress.position(), 90);
    }

    #[test]
    fn test_suffix_is_max_index_in_page() {
        let dir = TempDir::new().unwrap();
        let batcher = TemplateBatcher::new(dir.path(), 30);
        let mut progress = Progress::hidden(90);

        let pages = batcher.write_range(91..181, &source(300), &mut progress).unwrap();

        for page in &pages {
            let indices = labels_in(&page.path);
            assert_eq!(*indices.iter().max().unwrap(), page.key.last_index);
            assert_eq!(PageKey::from_path(&page.path), Some(page.key));
        }
    }

    #[test]
    fn test_trailing_partial_page_is_flushed() {
        let dir = TempDir::new().unwrap();
        let batcher = TemplateBatcher::new(dir.path(), 30);
        let mut progress = Progress::hidden(50);

        let pages = batcher.write_range(1..51, &source(300), &mut progress).unwrap();

        let keys: Vec<u64> = pages.iter().map(|p| p.key.last_index).collect();
        assert_eq!(keys, vec![30, 50]);
        assert_eq!(pages[1].items, 20);
        assert_eq!(labels_in(&pages[1].path), (31..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_indices_beyond_source_are_skipped() {
        let dir = TempDir::new().unwrap();
        let batcher = TemplateBatcher::new(dir.path(), 30);
        let mut progress = Progress::hidden(90);

        let pages = batcher.write_range(271..361, &source(300), &mut progress).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].key.last_index, 300);
        assert_eq!(pages[0].items, 30);
    }

    #[test]
    fn test_scan_sorts_numerically() {
        let dir = TempDir::new().unwrap();
        for n in [10, 9, 100, 2] {
            std::fs::write(dir.path().join(PageKey::new(n).file_name()), "").unwrap();
        }
        std::fs::write(dir.path().join("chunks-temp-notes.txt"), "").unwrap();

        let pages = scan_pages(&page_pattern(dir.path())).unwrap();

        let keys: Vec<u64> = pages.iter().map(|p| p.key.last_index).collect();
        assert_eq!(keys, vec![2, 9, 10, 100]);
    }

    #[test]
    fn test_key_from_path() {
        assert_eq!(
            PageKey::from_path(Path::new("/tmp/x/chunks-temp-42.txt")),
            Some(PageKey::new(42))
        );
        assert_eq!(PageKey::from_path(Path::new("/tmp/x/chunks-temp-.txt")), None);
        assert!(PageKey::new(9) < PageKey::new(10));
    }
}
