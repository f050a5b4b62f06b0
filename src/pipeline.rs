//! Batch orchestration
//!
//! A run walks fixed-width batches `[1, 1+W)`, `[1+W, 1+2W)`, ... across all items.
//! Each batch is templated into page files, rendered into one PDF and cleaned up
//! before the next batch starts. The run owns a temp directory for its lifetime.

use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::TempDir;

use crate::batcher::TemplateBatcher;
use crate::config::{RunConfig, Variant, BUILTIN_MERGE_PAGE_LIMIT};
use crate::consolidate::{consolidate, Consolidation};
use crate::error::{Error, Result};
use crate::ids::IdentifierGenerator;
use crate::item::{IdentifierItems, InventoryItems, ItemSource};
use crate::progress::Progress;
use crate::render::sheet::compress_xz;
use crate::render::{BatchLabel, Rasterizer, SheetRenderer};
use crate::template::DocumentTemplate;

/// Half-open batch ranges covering `1..=total`
///
/// Every range is `width` wide, so the last one may reach past `total`.
#[derive(Debug, Clone)]
pub struct BatchRanges {
    next: u64,
    total: u64,
    width: u64,
}

pub fn batch_ranges(total: u64, width: u64) -> BatchRanges {
    BatchRanges {
        next: 1,
        total,
        width: width.max(1),
    }
}

impl Iterator for BatchRanges {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        if self.next > self.total {
            return None;
        }
        let start = self.next;
        self.next += self.width;
        Some(start..self.next)
    }
}

/// Cut a batch range down to the items that exist
pub fn clamp_to_total(range: Range<u64>, total: u64) -> Range<u64> {
    range.start..range.end.min(total + 1)
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Batch files in batch order
    pub batch_outputs: Vec<PathBuf>,
    /// Identifier variant only
    pub consolidation: Option<Consolidation>,
    /// Identifier draws that had to be repeated
    pub collisions: u64,
    /// Set when the temp directory was kept
    pub temp_dir: Option<PathBuf>,
}

enum Labels {
    Identifiers(IdentifierItems),
    Inventory(InventoryItems),
}

impl Labels {
    fn source(&self) -> &dyn ItemSource {
        match self {
            Labels::Identifiers(items) => items as &dyn ItemSource,
            Labels::Inventory(items) => items,
        }
    }
}

/// One complete generation run
pub struct Run {
    config: RunConfig,
    template: DocumentTemplate,
    rasterizer: Box<dyn Rasterizer>,
    temp_dir: TempDir,
}

impl Run {
    pub fn new(
        config: RunConfig,
        template: DocumentTemplate,
        rasterizer: Box<dyn Rasterizer>,
    ) -> Result<Self> {
        config.validate()?;
        let temp_dir = tempfile::Builder::new()
            .prefix("ticket-sheets-")
            .tempdir()?;

        Ok(Self {
            config,
            template,
            rasterizer,
            temp_dir,
        })
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Run every batch, then consolidate
    ///
    /// On failure the temp directory is left on disk for inspection and its path is
    /// logged; finished batch files stay in the output directory.
    pub fn execute(self) -> Result<RunReport> {
        let Run {
            config,
            template,
            rasterizer,
            temp_dir,
        } = self;

        match run_batches(&config, template, rasterizer, temp_dir.path()) {
            Ok(mut report) => {
                if config.keep_temp {
                    report.temp_dir = Some(temp_dir.keep());
                } else {
                    temp_dir.close()?;
                }
                Ok(report)
            }
            Err(e) => {
                let kept = temp_dir.keep();
                warn!("Leaving temp artifacts in {}", kept.display());
                Err(e)
            }
        }
    }
}

fn run_batches(
    config: &RunConfig,
    template: DocumentTemplate,
    rasterizer: Box<dyn Rasterizer>,
    temp: &Path,
) -> Result<RunReport> {
    if config.exceeds_builtin_merge_limit() {
        warn!(
            "About {} pages will be consolidated in memory (limit {}); consider --merge-command",
            config.expected_pages(),
            BUILTIN_MERGE_PAGE_LIMIT
        );
    }

    let mut collisions = 0;
    let labels = match &config.variant {
        Variant::Identifiers { id_length, .. } => {
            let count = usize::try_from(config.total)
                .map_err(|_| Error::InvalidConfig(format!("too many items: {}", config.total)))?;

            info!("Generating {} identifiers", count);
            let mut generator = IdentifierGenerator::random(*id_length);
            let ids = generator.generate(count);
            collisions = generator.collisions();
            if collisions > 0 {
                info!("Redrew {} colliding identifiers", collisions);
            }

            Labels::Identifiers(IdentifierItems::new(ids, config.barcode.clone(), config.logo.clone()))
        }
        Variant::Inventory {
            inventory,
            lot,
            expiry,
        } => Labels::Inventory(InventoryItems {
            inventory: inventory.clone(),
            lot: lot.clone(),
            expiry: *expiry,
            count: config.total,
            barcode: config.barcode.clone(),
            logo: config.logo.clone(),
        }),
    };

    // The master file is compressed instead when batches are consolidated
    let compress_batches = config.compress && matches!(labels, Labels::Inventory(_));

    let batcher = TemplateBatcher::new(temp, config.page_size);
    let mut renderer = SheetRenderer::new(template, rasterizer, temp, &config.output_dir)
        .with_compression(compress_batches);
    let mut progress = if config.show_progress {
        Progress::new(config.progress_total())
    } else {
        Progress::hidden(config.progress_total())
    };

    let mut batch_outputs = Vec::new();
    for batch in batch_ranges(config.total, config.batch_size) {
        let range = clamp_to_total(batch, config.total);
        info!("Making a batch of tickets ({} - {})", range.start, range.end);

        let pages = batcher.write_range(range.clone(), labels.source(), &mut progress)?;
        let label = BatchLabel::new(config.naming.file_name(&range));
        batch_outputs.push(renderer.render(&pages, &label, &mut progress)?);
    }
    progress.finish();

    let consolidation = match (&config.variant, &labels) {
        (
            Variant::Identifiers {
                manifest,
                master,
                merge_tool,
                ..
            },
            Labels::Identifiers(items),
        ) => {
            let mut consolidation =
                consolidate(&batch_outputs, master, merge_tool, items.identifiers(), manifest)?;
            if config.compress {
                if let Some(master) = consolidation.master.take() {
                    consolidation.master = Some(compress_xz(&master)?);
                }
            }
            Some(consolidation)
        }
        _ => None,
    };

    info!("Done! {} batch files in {}", batch_outputs.len(), config.output_dir.display());

    Ok(RunReport {
        batch_outputs,
        consolidation,
        collisions,
        temp_dir: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_batch() {
        let ranges: Vec<_> = batch_ranges(90, 90).collect();
        assert_eq!(ranges, vec![1..91]);
    }

    #[test]
    fn test_last_batch_reaches_past_total() {
        let ranges: Vec<_> = batch_ranges(300, 90).collect();
        assert_eq!(ranges, vec![1..91, 91..181, 181..271, 271..361]);

        let clamped: Vec<_> = ranges.into_iter().map(|r| clamp_to_total(r, 300)).collect();
        assert_eq!(clamped.last(), Some(&(271..301)));
    }

    #[test]
    fn test_batches_never_overlap() {
        let ranges: Vec<_> = batch_ranges(1000, 70).collect();
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(ranges.first().map(|r| r.start), Some(1));
        assert!(ranges.last().unwrap().contains(&1000));
    }
}
