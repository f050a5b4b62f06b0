//! Paper formats for rasterized sheets

use std::fmt;
use std::str::FromStr;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

/// Fixed page format every sheet is rasterized to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperFormat {
    /// US Letter (8.5" × 11")
    #[default]
    Letter,
    /// A4 (210mm × 297mm)
    A4,
    /// US Legal (8.5" × 14")
    Legal,
}

impl PaperFormat {
    pub fn dimensions(&self) -> PageDimensions {
        match self {
            PaperFormat::Letter => PageDimensions {
                width: Length::from_mm(215.9),
                height: Length::from_mm(279.4),
            },
            PaperFormat::A4 => PageDimensions {
                width: Length::from_mm(210.0),
                height: Length::from_mm(297.0),
            },
            PaperFormat::Legal => PageDimensions {
                width: Length::from_mm(215.9),
                height: Length::from_mm(355.6),
            },
        }
    }

    /// Class name the print stylesheet uses for this size
    pub fn sheet_class(&self) -> &'static str {
        match self {
            PaperFormat::Letter => "letter",
            PaperFormat::A4 => "A4",
            PaperFormat::Legal => "legal",
        }
    }

    /// `@page` rule pinning the printed page to this format with no margins
    pub fn page_css(&self) -> String {
        let dims = self.dimensions();
        format!(
            "@page {{ size: {:.1}mm {:.1}mm; margin: 0 }}",
            dims.width.mm(),
            dims.height.mm()
        )
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaperFormat::Letter => "letter",
            PaperFormat::A4 => "a4",
            PaperFormat::Legal => "legal",
        })
    }
}

impl FromStr for PaperFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "letter" | "us-letter" => Ok(PaperFormat::Letter),
            "a4" => Ok(PaperFormat::A4),
            "legal" => Ok(PaperFormat::Legal),
            other => Err(format!("Unknown paper format: {}", other)),
        }
    }
}
