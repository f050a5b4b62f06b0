//! Ticket Sheets Library
//!
//! Generates large quantities of printable, barcoded ticket and label sheets.
//! This library provides functionality to:
//! - Generate unique, sorted identifiers
//! - Batch label markup into paginated temp files
//! - Rasterize each page to PDF and merge pages into batch files
//! - Consolidate batch files and write an identifier manifest
//!
//! # Example
//!
//! ```no_run
//! use ticket_sheets::config::RunConfig;
//! use ticket_sheets::pipeline::Run;
//! use ticket_sheets::render::PlaceholderRasterizer;
//! use ticket_sheets::template::{DocumentTemplate, SheetAssets};
//!
//! let config = RunConfig::default();
//! let template = DocumentTemplate::builtin(SheetAssets::load("assets".as_ref())?, config.paper);
//! let rasterizer = PlaceholderRasterizer::new(config.paper);
//!
//! let report = Run::new(config, template, Box::new(rasterizer))?.execute()?;
//! println!("{} batch files written", report.batch_outputs.len());
//! # Ok::<(), ticket_sheets::Error>(())
//! ```

pub mod error;
pub mod ids;
pub mod item;
pub mod layout;
pub mod template;
pub mod batcher;
pub mod render;
pub mod pdf;
pub mod progress;
pub mod config;
pub mod pipeline;
pub mod consolidate;

// Re-export commonly used items
pub use error::{Error, Result};
