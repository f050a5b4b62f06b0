//! Labels and their markup
//!
//! An [`Item`] is one label on a sheet. Items have no identity of their own: an
//! [`ItemSource`] builds them on demand from a 1-based item index.

use std::path::Path;

use base64::Engine;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::ids::Identifiers;

/// Barcode rendering directives, emitted as `jsbarcode-*` attributes
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeSpec {
    /// Symbology, `auto` lets the barcode script choose
    pub format: String,
    /// Width of a single bar in pixels
    pub width: u32,
    /// Bar height in pixels
    pub height: u32,
    /// Font size of the human-readable text
    pub font_size: u32,
    /// Gap between bars and text
    pub text_margin: u32,
}

impl Default for BarcodeSpec {
    fn default() -> Self {
        Self {
            format: "auto".to_string(),
            width: 2,
            height: 25,
            font_size: 8,
            text_margin: 0,
        }
    }
}

/// An image embedded into every label as a `data:` URI
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    data_uri: String,
}

impl Logo {
    /// Load a PNG or JPEG from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let mime = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("svg") => "image/svg+xml",
            _ => {
                return Err(Error::General(format!(
                    "Unsupported logo image type: {}",
                    path.display()
                )))
            }
        };

        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(mime, &bytes))
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            data_uri: format!("data:{};base64,{}", mime, encoded),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// One label's renderable content
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// 1-based position in the run
    pub index: u64,
    /// Human-readable caption printed above the barcode
    pub caption: String,
    /// Barcode payload
    pub value: String,
    pub barcode: BarcodeSpec,
    pub logo: Option<Logo>,
}

impl Item {
    /// Render this label as an HTML fragment
    pub fn markup(&self) -> String {
        let logo = match &self.logo {
            Some(logo) => format!(
                r#"
      <div class="label-left">
        <img src="{}" style="height:0.5in; width:auto; margin: 0 auto;">
      </div>
"#,
                logo.data_uri()
            ),
            None => String::new(),
        };

        format!(
            r#"
    <div class="label" data-index="{index}">{logo}
      <div class="label-right">
        <span>{caption}</span>
        <div>
          <svg
            class="barcode"
            jsbarcode-format="{format}"
            jsbarcode-width="{width}"
            jsbarcode-height="{height}"
            jsbarcode-fontsize="{font_size}"
            jsbarcode-value="{value}"
            jsbarcode-textmargin="{text_margin}">
          </svg>
        </div>
      </div>
    </div>
"#,
            index = self.index,
            logo = logo,
            caption = escape_html(&self.caption),
            format = escape_html(&self.barcode.format),
            width = self.barcode.width,
            height = self.barcode.height,
            font_size = self.barcode.font_size,
            value = escape_html(&self.value),
            text_margin = self.barcode.text_margin,
        )
    }
}

/// Builds items from 1-based indices
pub trait ItemSource {
    /// Item at `index`, `None` when the index is outside the source
    fn item(&self, index: u64) -> Option<Item>;

    /// Number of items the source can produce
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One label per issued identifier, encoding the identifier itself
pub struct IdentifierItems {
    ids: Identifiers,
    barcode: BarcodeSpec,
    logo: Option<Logo>,
}

impl IdentifierItems {
    pub fn new(ids: Identifiers, barcode: BarcodeSpec, logo: Option<Logo>) -> Self {
        Self { ids, barcode, logo }
    }

    pub fn identifiers(&self) -> &Identifiers {
        &self.ids
    }
}

impl ItemSource for IdentifierItems {
    fn item(&self, index: u64) -> Option<Item> {
        let id = self.ids.for_item(index)?;
        Some(Item {
            index,
            caption: id.to_string(),
            value: id.to_string(),
            barcode: self.barcode.clone(),
            logo: self.logo.clone(),
        })
    }

    fn len(&self) -> u64 {
        self.ids.len() as u64
    }
}

/// Identical inventory labels: `inventory | lot | expiry`, barcode encodes the lot
pub struct InventoryItems {
    pub inventory: String,
    pub lot: String,
    pub expiry: NaiveDate,
    pub count: u64,
    pub barcode: BarcodeSpec,
    pub logo: Option<Logo>,
}

impl ItemSource for InventoryItems {
    fn item(&self, index: u64) -> Option<Item> {
        if index == 0 || index > self.count {
            return None;
        }

        Some(Item {
            index,
            caption: format!(
                "{} | {} | {}",
                self.inventory,
                self.lot,
                format_expiry(self.expiry)
            ),
            value: self.lot.clone(),
            barcode: self.barcode.clone(),
            logo: self.logo.clone(),
        })
    }

    fn len(&self) -> u64 {
        self.count
    }
}

/// Parse an expiry date, accepting `2022-06-30` or `30.06.2022`
pub fn parse_expiry(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
        .map_err(|_| Error::InvalidConfig(format!("Invalid expiry date: {}", s)))
}

/// Expiry as printed on labels
pub fn format_expiry(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdentifierGenerator;

    fn inventory(count: u64) -> InventoryItems {
        InventoryItems {
            inventory: "F-100".to_string(),
            lot: "61208".to_string(),
            expiry: NaiveDate::from_ymd_opt(2022, 6, 30).unwrap(),
            count,
            barcode: BarcodeSpec::default(),
            logo: None,
        }
    }

    #[test]
    fn test_inventory_markup() {
        let item = inventory(5).item(3).unwrap();
        let markup = item.markup();

        assert!(markup.contains("F-100 | 61208 | 30.06.2022"));
        assert!(markup.contains(r#"jsbarcode-value="61208""#));
        assert!(markup.contains(r#"jsbarcode-format="auto""#));
        assert!(markup.contains(r#"data-index="3""#));
        assert!(!markup.contains("<img"));
    }

    #[test]
    fn test_inventory_out_of_range() {
        let items = inventory(5);
        assert!(items.item(0).is_none());
        assert!(items.item(6).is_none());
        assert!(items.item(5).is_some());
    }

    #[test]
    fn test_identifier_items_follow_sorted_order() {
        let mut draws = vec!["zz", "aa", "mm"].into_iter();
        let mut generator =
            IdentifierGenerator::with_draw(move || draws.next().unwrap_or("00").to_string());
        let items = IdentifierItems::new(generator.generate(3), BarcodeSpec::default(), None);

        assert_eq!(items.len(), 3);
        assert_eq!(items.item(1).unwrap().value, "aa");
        assert_eq!(items.item(3).unwrap().value, "zz");
        assert!(items.item(4).is_none());
    }

    #[test]
    fn test_logo_embedded_as_data_uri() {
        let logo = Logo::from_bytes("image/png", b"png");
        assert_eq!(logo.data_uri(), "data:image/png;base64,cG5n");

        let mut items = inventory(1);
        items.logo = Some(logo);
        assert!(items.item(1).unwrap().markup().contains(r#"<img src="data:image/png;base64,cG5n""#));
    }

    #[test]
    fn test_caption_is_escaped() {
        let mut items = inventory(1);
        items.inventory = "<F&1>".to_string();
        let markup = items.item(1).unwrap().markup();
        assert!(markup.contains("&lt;F&amp;1&gt;"));
    }

    #[test]
    fn test_parse_expiry_formats() {
        let expected = NaiveDate::from_ymd_opt(2022, 6, 30).unwrap();
        assert_eq!(parse_expiry("2022-06-30").unwrap(), expected);
        assert_eq!(parse_expiry("30.06.2022").unwrap(), expected);
        assert!(parse_expiry("June 30").is_err());
        assert_eq!(format_expiry(expected), "30.06.2022");
    }
}
