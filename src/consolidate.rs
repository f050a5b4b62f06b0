//! Final consolidation of batch files and the identifier manifest

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{error, info};

use crate::error::{Error, Result};
use crate::ids::Identifiers;
use crate::config::MergeTool;
use crate::pdf::{count_pages, merge_pdfs, MergeOptions};

/// Header row of the identifier manifest
pub const MANIFEST_HEADER: &str = "uuid";

/// Outcome of consolidating a run
#[derive(Debug, Clone)]
pub struct Consolidation {
    /// Master file, `None` when merging failed
    pub master: Option<PathBuf>,
    /// Pages in the master file, when it could be counted
    pub pages: Option<usize>,
    pub manifest: PathBuf,
}

/// Merge batch outputs into `master`, then write the manifest
///
/// A failed merge is logged and does not stop the manifest from being written.
pub fn consolidate(
    batch_outputs: &[PathBuf],
    master: &Path,
    tool: &MergeTool,
    ids: &Identifiers,
    manifest: &Path,
) -> Result<Consolidation> {
    let (master, pages) = match merge_batches(batch_outputs, master, tool) {
        Ok(pages) => {
            info!("Consolidated {} batch files into {}", batch_outputs.len(), master.display());
            (Some(master.to_path_buf()), pages)
        }
        Err(e) => {
            error!("Could not consolidate batch files: {}", e);
            (None, None)
        }
    };

    write_manifest(ids, manifest)?;
    info!("Wrote {} identifiers to {}", ids.len(), manifest.display());

    Ok(Consolidation {
        master,
        pages,
        manifest: manifest.to_path_buf(),
    })
}

/// Merge batch files, ordered by file name, into `master`
pub fn merge_batches(batch_outputs: &[PathBuf], master: &Path, tool: &MergeTool) -> Result<Option<usize>> {
    let mut inputs = batch_outputs.to_vec();
    inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if let Some(parent) = master.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match tool {
        MergeTool::Builtin => {
            let pages = merge_pdfs(&MergeOptions {
                input_paths: inputs,
                output_path: master.to_path_buf(),
            })?;
            Ok(Some(pages))
        }
        MergeTool::External { program, args } => {
            let output = Command::new(program)
                .args(args)
                .args(&inputs)
                .arg(master)
                .output()
                .map_err(|e| Error::ExternalTool {
                    tool: program.clone(),
                    message: e.to_string(),
                })?;

            if !output.status.success() {
                return Err(Error::ExternalTool {
                    tool: program.clone(),
                    message: format!(
                        "exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                });
            }
            Ok(count_pages(master).ok())
        }
    }
}

/// Write `ids` as a one-column CSV with a `uuid` header, in sorted order
pub fn write_manifest(ids: &Identifiers, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([MANIFEST_HEADER])?;
    for id in ids.iter() {
        writer.write_record([id])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdentifierGenerator;
    use crate::layout::PaperFormat;
    use crate::pdf::write_blank_page;
    use tempfile::TempDir;

    fn ids(values: &[&'static str]) -> Identifiers {
        let mut draws = values.to_vec().into_iter();
        IdentifierGenerator::with_draw(move || draws.next().unwrap_or("~").to_string())
            .generate(values.len())
    }

    #[test]
    fn test_manifest_sorted_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identifiers.csv");

        write_manifest(&ids(&["b2", "a1", "c3"]), &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "uuid\na1\nb2\nc3\n");
    }

    #[test]
    fn test_merge_failure_still_writes_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("identifiers.csv");

        let result = consolidate(
            &[dir.path().join("missing.pdf")],
            &dir.path().join("tickets.pdf"),
            &MergeTool::Builtin,
            &ids(&["x"]),
            &manifest,
        )
        .unwrap();

        assert!(result.master.is_none());
        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), "uuid\nx\n");
    }

    #[test]
    fn test_external_tool_missing() {
        let dir = TempDir::new().unwrap();
        let tool = MergeTool::External {
            program: "/nonexistent/pdfunite".to_string(),
            args: vec![],
        };

        let result = merge_batches(&[], &dir.path().join("all.pdf"), &tool);
        assert!(matches!(result.unwrap_err(), Error::ExternalTool { .. }));
    }

    #[test]
    fn test_batches_merged_in_file_name_order() {
        let dir = TempDir::new().unwrap();
        let mut outputs = Vec::new();
        for name in ["091-180-tickets.pdf", "001-090-tickets.pdf"] {
            let path = dir.path().join(name);
            write_blank_page(&path, PaperFormat::Letter, name).unwrap();
            outputs.push(path);
        }
        let master = dir.path().join("all").join("tickets.pdf");

        let pages = merge_batches(&outputs, &master, &MergeTool::Builtin).unwrap();

        assert_eq!(pages, Some(2));
        assert_eq!(count_pages(&master).unwrap(), 2);
    }
}
