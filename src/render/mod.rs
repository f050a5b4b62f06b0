//! Rasterizing HTML sheets to single-page PDFs

pub mod sheet;

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::layout::PaperFormat;
use crate::pdf::write_blank_page;

pub use sheet::{BatchLabel, SheetRenderer};

/// Renders a complete HTML document to a single fixed-format PDF page
pub trait Rasterizer {
    fn rasterize(&mut self, document: &str, output: &Path) -> Result<()>;
}

/// Rasterizer driving a headless Chromium binary
///
/// Each call writes the document next to the output as an `.html` surface, prints it
/// with `--print-to-pdf` and removes the surface again. Page size comes from the
/// document's `@page` rule.
#[derive(Debug, Clone)]
pub struct ChromiumRasterizer {
    executable: PathBuf,
    extra_args: Vec<String>,
    /// Time budget for page scripts (barcode initialisation) before printing
    script_budget_ms: u32,
}

impl ChromiumRasterizer {
    /// Check that the browser starts and return a rasterizer using it
    pub fn launch(executable: impl Into<PathBuf>, extra_args: Vec<String>) -> Result<Self> {
        let executable = executable.into();
        let output = Command::new(&executable)
            .arg("--version")
            .output()
            .map_err(|e| Error::Rasterize {
                page: "browser launch".to_string(),
                message: format!("{}: {}", executable.display(), e),
            })?;

        if !output.status.success() {
            return Err(Error::Rasterize {
                page: "browser launch".to_string(),
                message: format!("{} exited with {}", executable.display(), output.status),
            });
        }

        info!(
            "Using {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );

        Ok(Self {
            executable,
            extra_args,
            script_budget_ms: 5000,
        })
    }

    fn print_to_pdf(&self, surface: &Path, output: &Path) -> Result<()> {
        let surface_url = file_url(surface)?;
        let output_abs = std::path::absolute(output)?;

        let result = Command::new(&self.executable)
            .args(self.print_args(&output_abs))
            .arg(surface_url.as_str())
            .output()
            .map_err(|e| Error::Rasterize {
                page: surface.display().to_string(),
                message: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(Error::Rasterize {
                page: surface.display().to_string(),
                message: format!(
                    "browser exited with {}: {}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            });
        }
        if !output.exists() {
            return Err(Error::Rasterize {
                page: surface.display().to_string(),
                message: format!("browser wrote no PDF to {}", output.display()),
            });
        }

        Ok(())
    }

    /// Arguments preceding the page URL
    fn print_args(&self, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = [
            "--headless",
            "--disable-gpu",
            "--no-pdf-header-footer",
            "--run-all-compositor-stages-before-draw",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();
        args.push(format!("--virtual-time-budget={}", self.script_budget_ms));
        args.push(format!("--print-to-pdf={}", output.display()));
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Percent-encoded `file://` URL for a local path
fn file_url(path: &Path) -> Result<Url> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute).map_err(|_| Error::Rasterize {
        page: path.display().to_string(),
        message: "path cannot be expressed as a file URL".to_string(),
    })
}

impl Rasterizer for ChromiumRasterizer {
    fn rasterize(&mut self, document: &str, output: &Path) -> Result<()> {
        let surface = output.with_extension("html");
        std::fs::write(&surface, document)?;
        debug!("Printing {} to {}", surface.display(), output.display());

        let printed = self.print_to_pdf(&surface, output);
        if let Err(e) = std::fs::remove_file(&surface) {
            warn!("Could not remove {}: {}", surface.display(), e);
        }
        printed
    }
}

/// Rasterizer that emits a blank page of the configured paper size
///
/// Used for dry runs: every pipeline stage runs, nothing is drawn.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderRasterizer {
    paper: PaperFormat,
}

impl PlaceholderRasterizer {
    pub fn new(paper: PaperFormat) -> Self {
        Self { paper }
    }
}

impl Rasterizer for PlaceholderRasterizer {
    fn rasterize(&mut self, document: &str, output: &Path) -> Result<()> {
        let title = output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Placeholder page {} ({} bytes of markup)", title, document.len());
        write_blank_page(output, self.paper, &title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::extract_metadata;
    use tempfile::TempDir;

    #[test]
    fn test_launch_missing_browser() {
        let result = ChromiumRasterizer::launch("/nonexistent/chromium", vec![]);
        assert!(matches!(result.unwrap_err(), Error::Rasterize { .. }));
    }

    /// Shell script standing in for Chromium: answers `--version`, records its
    /// arguments one per line and acts on `--print-to-pdf` according to `mode`
    #[cfg(unix)]
    fn stub_browser(dir: &Path, mode: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let args_file = dir.join("args.txt");
        let script = format!(
            r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo "Stub Chromium 1.0"; exit 0; fi
: > "{args}"
out=""
for arg in "$@"; do
  printf '%s\n' "$arg" >> "{args}"
  case "$arg" in --print-to-pdf=*) out="${{arg#--print-to-pdf=}}" ;; esac
done
case "{mode}" in
  ok) printf '%%PDF-1.5 stub' > "$out" ;;
  silent) ;;
  fail) echo "renderer crashed" >&2; exit 3 ;;
esac
"#,
            args = args_file.display(),
            mode = mode
        );

        let path = dir.join("chromium");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn recorded_args(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn test_chromium_arguments_and_surface_cleanup() {
        let dir = TempDir::new().unwrap();
        let browser = stub_browser(dir.path(), "ok");
        let output = dir.path().join("tickets-0.pdf");

        let mut chromium =
            ChromiumRasterizer::launch(&browser, vec!["--no-sandbox".to_string()]).unwrap();
        chromium.rasterize("<html></html>", &output).unwrap();

        let args = recorded_args(dir.path());
        assert_eq!(args[0], "--headless");
        assert!(args.contains(&"--no-pdf-header-footer".to_string()));
        assert!(args.contains(&format!("--print-to-pdf={}", std::path::absolute(&output).unwrap().display())));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.last().unwrap().starts_with("file://"));
        assert!(args.last().unwrap().ends_with("/tickets-0.html"));

        assert!(output.exists());
        assert!(!dir.path().join("tickets-0.html").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_chromium_url_is_percent_encoded() {
        let dir = tempfile::Builder::new().prefix("my dir #1 ").tempdir().unwrap();
        let browser = stub_browser(dir.path(), "ok");
        let output = dir.path().join("tickets-0.pdf");

        let mut chromium = ChromiumRasterizer::launch(&browser, vec![]).unwrap();
        chromium.rasterize("<html></html>", &output).unwrap();

        let url = recorded_args(dir.path()).pop().unwrap();
        assert!(url.contains("my%20dir%20%231%20"), "unexpected url {}", url);
        assert!(!url.contains('#') && !url.contains(' '));

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.to_file_path().unwrap(), std::path::absolute(dir.path().join("tickets-0.html")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_chromium_success_without_pdf_is_an_error() {
        let dir = TempDir::new().unwrap();
        let browser = stub_browser(dir.path(), "silent");
        let output = dir.path().join("tickets-0.pdf");

        let mut chromium = ChromiumRasterizer::launch(&browser, vec![]).unwrap();
        let result = chromium.rasterize("<html></html>", &output);

        match result.unwrap_err() {
            Error::Rasterize { message, .. } => assert!(message.contains("no PDF")),
            other => panic!("unexpected error {}", other),
        }
        assert!(!dir.path().join("tickets-0.html").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_chromium_failure_reports_stderr_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let browser = stub_browser(dir.path(), "fail");
        let output = dir.path().join("tickets-0.pdf");

        let mut chromium = ChromiumRasterizer::launch(&browser, vec![]).unwrap();
        let result = chromium.rasterize("<html></html>", &output);

        match result.unwrap_err() {
            Error::Rasterize { message, .. } => assert!(message.contains("renderer crashed")),
            other => panic!("unexpected error {}", other),
        }
        assert!(!dir.path().join("tickets-0.html").exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_placeholder_writes_one_page() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tickets-0.pdf");

        PlaceholderRasterizer::new(PaperFormat::A4)
            .rasterize("<html></html>", &output)
            .unwrap();

        let metadata = extract_metadata(&output).unwrap();
        assert_eq!(metadata.page_count, 1);
        assert_eq!(metadata.title.as_deref(), Some("tickets-0"));
    }
}
