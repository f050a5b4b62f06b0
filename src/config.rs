//! Run configuration

use std::ops::Range;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::batcher::DEFAULT_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::ids::DEFAULT_ID_LENGTH;
use crate::item::{BarcodeSpec, Logo};
use crate::layout::PaperFormat;

/// Default number of items per batch
pub const DEFAULT_BATCH_SIZE: u64 = 90;

/// Default number of items in a run
pub const DEFAULT_TOTAL: u64 = 300;

/// Page count above which the builtin merge, which holds every batch file in
/// memory at once, should be replaced by an external merge command
pub const BUILTIN_MERGE_PAGE_LIMIT: u64 = 5_000;

/// What goes on the labels
#[derive(Debug, Clone)]
pub enum Variant {
    /// One unique identifier per label, consolidated into a master PDF plus manifest
    Identifiers {
        id_length: usize,
        /// Manifest path, written as CSV with a `uuid` header
        manifest: PathBuf,
        /// Consolidated output path
        master: PathBuf,
        merge_tool: MergeTool,
    },
    /// Identical inventory labels, one PDF per batch
    Inventory {
        inventory: String,
        lot: String,
        expiry: NaiveDate,
    },
}

/// How batch PDFs are combined into the master file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MergeTool {
    /// In-process lopdf merge
    #[default]
    Builtin,
    /// `<program> <args...> <inputs...> <output>`
    External { program: String, args: Vec<String> },
}

/// Batch output file naming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchNaming {
    /// `<first>-<last>-tickets.pdf`, inclusive bounds zero-padded to `width` digits
    Padded { width: usize },
    /// `tickets-<start>-<end>.pdf` with the half-open bounds as iterated
    Simple,
}

impl BatchNaming {
    /// Padded naming wide enough for every index up to `total`
    pub fn padded_for(total: u64) -> Self {
        BatchNaming::Padded {
            width: total.to_string().len(),
        }
    }

    pub fn file_name(&self, range: &Range<u64>) -> String {
        match *self {
            BatchNaming::Padded { width } => format!(
                "{:0width$}-{:0width$}-tickets.pdf",
                range.start,
                range.end.saturating_sub(1),
                width = width
            ),
            BatchNaming::Simple => format!("tickets-{}-{}.pdf", range.start, range.end),
        }
    }
}

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub total: u64,
    pub batch_size: u64,
    pub page_size: usize,
    pub output_dir: PathBuf,
    pub paper: PaperFormat,
    pub barcode: BarcodeSpec,
    pub logo: Option<Logo>,
    pub variant: Variant,
    pub naming: BatchNaming,
    /// Compress each batch PDF with `xz`
    pub compress: bool,
    /// Keep the temp directory after a successful run
    pub keep_temp: bool,
    /// Draw the progress bar on stderr
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        let output_dir = PathBuf::from("output");
        Self {
            total: DEFAULT_TOTAL,
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            paper: PaperFormat::Letter,
            barcode: BarcodeSpec::default(),
            logo: None,
            variant: Variant::Identifiers {
                id_length: DEFAULT_ID_LENGTH,
                manifest: output_dir.join("identifiers.csv"),
                master: output_dir.join("tickets.pdf"),
                merge_tool: MergeTool::Builtin,
            },
            naming: BatchNaming::padded_for(DEFAULT_TOTAL),
            output_dir,
            compress: false,
            keep_temp: false,
            show_progress: true,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.total == 0 {
            return Err(Error::InvalidConfig("total must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page size must be at least 1".to_string()));
        }
        if let Variant::Identifiers { id_length, merge_tool, .. } = &self.variant {
            if *id_length == 0 {
                return Err(Error::InvalidConfig(
                    "identifier length must be at least 1".to_string(),
                ));
            }
            // 62^len must comfortably exceed the requested count
            let space = 62f64.powi(*id_length as i32);
            if space < (self.total as f64) * 2.0 {
                return Err(Error::InvalidConfig(format!(
                    "identifier length {} cannot produce {} unique identifiers",
                    id_length, self.total
                )));
            }
            if let MergeTool::External { program, .. } = merge_tool {
                if program.trim().is_empty() {
                    return Err(Error::InvalidConfig("merge command is empty".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Pages the run renders, at least one per `page_size` items
    pub fn expected_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1) as u64)
    }

    /// Whether consolidation would merge more pages in memory than
    /// [`BUILTIN_MERGE_PAGE_LIMIT`]
    pub fn exceeds_builtin_merge_limit(&self) -> bool {
        matches!(
            &self.variant,
            Variant::Identifiers {
                merge_tool: MergeTool::Builtin,
                ..
            }
        ) && self.expected_pages() > BUILTIN_MERGE_PAGE_LIMIT
    }

    /// Ticks the progress indicator advances through: one per item templated, one per
    /// item rendered
    pub fn progress_total(&self) -> u64 {
        self.total * 2
    }
}
