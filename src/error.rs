//! Error types for the ticket sheet pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ticket sheet pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Browser launch or page rasterization failed
    #[error("Rasterization failed for {page}: {message}")]
    Rasterize { page: String, message: String },

    /// An external program (merge tool, compressor) failed
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Rejected run configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error
    #[error("{0}")]
    General(String),
}
