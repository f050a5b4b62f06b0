//! Ticket Sheets CLI tool
//!
//! A command-line tool for generating barcoded ticket and label sheets as PDF.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use log::{info, warn};

use ticket_sheets::batcher::scan_pages;
use ticket_sheets::config::{BatchNaming, MergeTool, RunConfig, Variant};
use ticket_sheets::item::{parse_expiry, BarcodeSpec, Logo};
use ticket_sheets::layout::PaperFormat;
use ticket_sheets::pdf::{extract_metadata, merge_pdfs, MergeOptions};
use ticket_sheets::pipeline::Run;
use ticket_sheets::progress::Progress;
use ticket_sheets::render::{BatchLabel, ChromiumRasterizer, PlaceholderRasterizer, Rasterizer, SheetRenderer};
use ticket_sheets::template::{DocumentTemplate, SheetAssets};

/// Ticket Sheets - Generate barcoded ticket and label sheets
#[derive(Parser)]
#[command(name = "ticket-sheets")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # 1,000,000 unique tickets, one master PDF plus identifiers.csv
    ticket-sheets identifiers --total 1000000 --assets-dir assets

    # 300 inventory labels, one PDF per 90 labels
    ticket-sheets labels --inventory F-100 --lot 61208 --expiry 30.06.2022 --total 300

    # Exercise the whole pipeline without a browser
    ticket-sheets identifiers --total 90 --dry-run

    # Re-render pages left behind by a failed run
    ticket-sheets render \"/tmp/ticket-sheets-XXXX/chunks-temp-*.txt\" -o recovered.pdf")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate unique identifier tickets, consolidate them and write a manifest
    Identifiers {
        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Identifier length in characters
        #[arg(long, default_value_t = ticket_sheets::ids::DEFAULT_ID_LENGTH)]
        id_length: usize,

        /// Manifest path (default: <output-dir>/identifiers.csv)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Consolidated PDF path (default: <output-dir>/tickets.pdf)
        #[arg(long)]
        master: Option<PathBuf>,

        /// External merge command, invoked as `<command> <inputs...> <output>`
        ///
        /// The built-in merge holds every batch file in memory; use an external tool
        /// (e.g. "pdfunite") for runs above 5000 pages.
        #[arg(long)]
        merge_command: Option<String>,
    },

    /// Generate identical inventory labels, one PDF per batch
    Labels {
        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Inventory code printed on each label
        #[arg(long)]
        inventory: String,

        /// Lot number, printed and encoded as the barcode
        #[arg(long)]
        lot: String,

        /// Expiry date (e.g. "2022-06-30" or "30.06.2022")
        #[arg(long)]
        expiry: String,
    },

    /// Render leftover page files into one PDF
    Render {
        /// Glob matching page files, e.g. "/tmp/ticket-sheets-*/chunks-temp-*.txt"
        pattern: String,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

/// Run size and output options
#[derive(Args)]
struct BatchArgs {
    /// Number of items to generate
    #[arg(long, default_value_t = ticket_sheets::config::DEFAULT_TOTAL)]
    total: u64,

    /// Items per batch file
    #[arg(long, default_value_t = ticket_sheets::config::DEFAULT_BATCH_SIZE)]
    batch_size: u64,

    /// Labels per page
    #[arg(long, default_value_t = ticket_sheets::batcher::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Directory for batch PDFs
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Compress outputs with xz
    #[arg(long)]
    compress: bool,

    /// Keep the temp directory after a successful run
    #[arg(long)]
    keep_temp: bool,

    /// Do not draw the progress bar
    #[arg(long)]
    no_progress: bool,
}

/// Sheet rendering options
#[derive(Args)]
struct RenderArgs {
    /// Directory holding normalize.css, paper.min.css and JsBarcode.all.min.js
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// Custom document template (default: built-in)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Paper format: letter, a4 or legal
    #[arg(long, default_value_t = PaperFormat::Letter)]
    paper: PaperFormat,

    /// Chromium or Chrome executable
    #[arg(long, default_value = "chromium")]
    browser: PathBuf,

    /// Extra argument passed to the browser (repeatable), e.g. --browser-arg=--no-sandbox
    #[arg(long)]
    browser_arg: Vec<String>,

    /// Write blank pages instead of launching a browser
    #[arg(long)]
    dry_run: bool,

    /// PNG or JPEG logo shown on every label
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Barcode symbology (JsBarcode format name)
    #[arg(long, default_value = "auto")]
    barcode_format: String,

    /// Barcode height in pixels
    #[arg(long, default_value_t = 25)]
    barcode_height: u32,
}

impl RenderArgs {
    fn template(&self) -> anyhow::Result<DocumentTemplate> {
        let assets = SheetAssets::load(&self.assets_dir)
            .with_context(|| format!("loading assets from {}", self.assets_dir.display()))?;
        let template = match &self.template {
            Some(path) => DocumentTemplate::from_file(path, assets, self.paper)?,
            None => DocumentTemplate::builtin(assets, self.paper),
        };
        Ok(template)
    }

    fn rasterizer(&self) -> anyhow::Result<Box<dyn Rasterizer>> {
        if self.dry_run {
            info!("Dry run: writing blank pages");
            return Ok(Box::new(PlaceholderRasterizer::new(self.paper)));
        }
        let chromium = ChromiumRasterizer::launch(&self.browser, self.browser_arg.clone())?;
        Ok(Box::new(chromium))
    }

    fn barcode(&self) -> BarcodeSpec {
        BarcodeSpec {
            format: self.barcode_format.clone(),
            height: self.barcode_height,
            ..BarcodeSpec::default()
        }
    }

    fn logo(&self) -> anyhow::Result<Option<Logo>> {
        self.logo
            .as_deref()
            .map(|path| Logo::load(path).with_context(|| format!("loading logo {}", path.display())))
            .transpose()
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Identifiers {
            batch,
            render,
            id_length,
            manifest,
            master,
            merge_command,
        } => {
            let variant = Variant::Identifiers {
                id_length,
                manifest: manifest.unwrap_or_else(|| batch.output_dir.join("identifiers.csv")),
                master: master.unwrap_or_else(|| batch.output_dir.join("tickets.pdf")),
                merge_tool: parse_merge_command(merge_command.as_deref()),
            };
            let naming = BatchNaming::padded_for(batch.total);
            cmd_generate(batch, render, variant, naming)
        }
        Commands::Labels {
            batch,
            render,
            inventory,
            lot,
            expiry,
        } => parse_expiry(&expiry)
            .map_err(anyhow::Error::from)
            .and_then(|expiry| {
                let variant = Variant::Inventory {
                    inventory,
                    lot,
                    expiry,
                };
                cmd_generate(batch, render, variant, BatchNaming::Simple)
            }),
        Commands::Render {
            pattern,
            output,
            render,
        } => cmd_render(&pattern, &output, &render),
        Commands::Merge { inputs, output } => cmd_merge(inputs, &output),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn parse_merge_command(command: Option<&str>) -> MergeTool {
    let Some(command) = command else {
        return MergeTool::Builtin;
    };
    let mut parts = command.split_whitespace().map(str::to_string);
    match parts.next() {
        Some(program) => MergeTool::External {
            program,
            args: parts.collect(),
        },
        None => MergeTool::Builtin,
    }
}

/// Run the batch pipeline
fn cmd_generate(
    batch: BatchArgs,
    render: RenderArgs,
    variant: Variant,
    naming: BatchNaming,
) -> anyhow::Result<()> {
    let config = RunConfig {
        total: batch.total,
        batch_size: batch.batch_size,
        page_size: batch.page_size,
        output_dir: batch.output_dir,
        paper: render.paper,
        barcode: render.barcode(),
        logo: render.logo()?,
        variant,
        naming,
        compress: batch.compress,
        keep_temp: batch.keep_temp,
        show_progress: !batch.no_progress,
    };

    let template = render.template()?;
    let rasterizer = render.rasterizer()?;

    info!("Starting PDF generation...");
    let report = Run::new(config, template, rasterizer)?.execute()?;

    eprintln!("Wrote {} batch files", report.batch_outputs.len());
    if let Some(consolidation) = &report.consolidation {
        match (&consolidation.master, consolidation.pages) {
            (Some(master), Some(pages)) => eprintln!("Master: {} ({} pages)", master.display(), pages),
            (Some(master), None) => eprintln!("Master: {}", master.display()),
            (None, _) => warn!("No master file was produced"),
        }
        eprintln!("Manifest: {}", consolidation.manifest.display());
    }
    if let Some(temp) = &report.temp_dir {
        eprintln!("Temp files kept in {}", temp.display());
    }

    Ok(())
}

/// Render leftover page files into one PDF
fn cmd_render(pattern: &str, output: &Path, render: &RenderArgs) -> anyhow::Result<()> {
    let template = render.template()?;
    let rasterizer = render.rasterizer()?;

    let temp = tempfile::Builder::new().prefix("ticket-sheets-render-").tempdir()?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = output
        .file_name()
        .context("output path has no file name")?
        .to_string_lossy()
        .into_owned();

    let pages = scan_pages(pattern)?;
    if pages.is_empty() {
        bail!("No page files matched pattern: {}", pattern);
    }
    let mut progress = Progress::new(pages.len() as u64);
    let mut renderer = SheetRenderer::new(template, rasterizer, temp.path(), output_dir);
    let written = renderer.render(&pages, &BatchLabel::new(file_name), &mut progress)?;
    progress.finish();

    eprintln!("Rendered {} pages to {}", pages.len(), written.display());
    Ok(())
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: Vec<String>, output: &Path) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;

    eprintln!("Merging {} PDF files...", inputs.len());
    let pages = merge_pdfs(&MergeOptions {
        input_paths: inputs,
        output_path: output.to_path_buf(),
    })?;
    eprintln!("Merged {} pages to: {}", pages, output.display());

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> anyhow::Result<()> {
    let metadata = extract_metadata(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}
