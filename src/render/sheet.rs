//! Rendering a batch of page files into one PDF

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::batcher::{scan_pages, sort_pages, PageFile};
use crate::error::{Error, Result};
use crate::pdf::{merge_pdfs, MergeOptions};
use crate::progress::Progress;
use crate::render::Rasterizer;
use crate::template::DocumentTemplate;

/// Names the merged output of one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLabel {
    /// Output file name, relative to the output directory
    pub file_name: String,
}

impl BatchLabel {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// Wraps page fragments in the document template, rasterizes and merges them
///
/// Pages are processed strictly one at a time: a single rendering surface and a
/// single page of markup are alive at any moment.
pub struct SheetRenderer {
    template: DocumentTemplate,
    rasterizer: Box<dyn Rasterizer>,
    temp_dir: PathBuf,
    output_dir: PathBuf,
    compress: bool,
}

impl SheetRenderer {
    pub fn new(
        template: DocumentTemplate,
        rasterizer: Box<dyn Rasterizer>,
        temp_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template,
            rasterizer,
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
            compress: false,
        }
    }

    /// Compress each batch PDF with `xz` once its temp files are gone
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Render every page file matching `pattern` into one batch PDF
    pub fn render_glob(
        &mut self,
        pattern: &str,
        label: &BatchLabel,
        progress: &mut Progress,
    ) -> Result<PathBuf> {
        let pages = scan_pages(pattern)?;
        if pages.is_empty() {
            return Err(Error::NoFilesMatched(pattern.to_string()));
        }
        self.render(&pages, label, progress)
    }

    /// Render `pages` into one batch PDF and delete their temp artifacts
    ///
    /// Returns the path of the batch file (the `.xz` path when compressing).
    pub fn render(
        &mut self,
        pages: &[PageFile],
        label: &BatchLabel,
        progress: &mut Progress,
    ) -> Result<PathBuf> {
        if pages.is_empty() {
            return Err(Error::General(format!(
                "No pages to render for {}",
                label.file_name
            )));
        }

        let mut pages = pages.to_vec();
        sort_pages(&mut pages);

        let mut page_pdfs = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let fragment = std::fs::read_to_string(&page.path)?;
            let document = self.template.render(&fragment);

            let page_pdf = self.temp_dir.join(format!("tickets-{}.pdf", index));
            self.rasterizer.rasterize(&document, &page_pdf)?;
            debug!("Rasterized page {} to {}", page.key.last_index, page_pdf.display());
            page_pdfs.push(page_pdf);

            progress.inc(page.items);
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(&label.file_name);

        info!("Consolidating {} pages into {}", page_pdfs.len(), output_path.display());
        merge_pdfs(&MergeOptions {
            input_paths: page_pdfs.clone(),
            output_path: output_path.clone(),
        })?;

        remove_all(&page_pdfs)?;
        let sources: Vec<PathBuf> = pages.into_iter().map(|page| page.path).collect();
        remove_all(&sources)?;
        debug!("Deleted {} page pdfs and {} page files", page_pdfs.len(), sources.len());

        if self.compress {
            return compress_xz(&output_path);
        }
        Ok(output_path)
    }
}

fn remove_all(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Compress `path` in place with `xz`, returning the `.xz` path
pub fn compress_xz(path: &Path) -> Result<PathBuf> {
    info!("Zipping PDF into {}.xz", path.display());
    let output = Command::new("xz")
        .arg("--force")
        .arg(path)
        .output()
        .map_err(|e| Error::ExternalTool {
            tool: "xz".to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "xz".to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let mut compressed = path.as_os_str().to_owned();
    compressed.push(".xz");
    Ok(PathBuf::from(compressed))
}
