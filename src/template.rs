//! Sheet document template and its shared assets
//!
//! The template is an HTML document carrying four literal placeholders. Each is
//! replaced once, at its first occurrence: the normalize stylesheet, the print
//! layout stylesheet, the barcode script and the page's label fragment.

use std::path::Path;

use crate::error::{Error, Result};
use crate::layout::PaperFormat;

pub const NORMALIZE_PLACEHOLDER: &str = "INJECT_NORMALIZE";
pub const PAPER_CSS_PLACEHOLDER: &str = "INJECT_PAPER_CSS";
pub const BARCODE_JS_PLACEHOLDER: &str = "INJECT_JSBARCODE";
pub const CONTENT_PLACEHOLDER: &str = "INJECT_CONTENT";

/// Turns every `.barcode` placeholder element into a rendered barcode
pub const BARCODE_INIT_SCRIPT: &str = r#"JsBarcode(".barcode").init();"#;

/// Asset file names looked up inside the assets directory
pub const NORMALIZE_FILE: &str = "normalize.css";
pub const PAPER_CSS_FILE: &str = "paper.min.css";
pub const BARCODE_JS_FILE: &str = "JsBarcode.all.min.js";

const BUILTIN_TEMPLATE: &str = include_str!("../templates/sheet.html");

/// Stylesheets and script shared by every page
#[derive(Debug, Clone, Default)]
pub struct SheetAssets {
    pub normalize_css: String,
    pub paper_css: String,
    pub barcode_js: String,
}

impl SheetAssets {
    /// Read the three asset files from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            normalize_css: read_asset(&dir.join(NORMALIZE_FILE))?,
            paper_css: read_asset(&dir.join(PAPER_CSS_FILE))?,
            barcode_js: read_asset(&dir.join(BARCODE_JS_FILE))?,
        })
    }
}

fn read_asset(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Full-document template a page fragment is wrapped in
#[derive(Debug, Clone)]
pub struct DocumentTemplate {
    source: String,
    assets: SheetAssets,
    paper: PaperFormat,
}

impl DocumentTemplate {
    /// The template shipped with the crate
    pub fn builtin(assets: SheetAssets, paper: PaperFormat) -> Self {
        Self::new(BUILTIN_TEMPLATE.to_string(), assets, paper)
    }

    /// Load a custom template from disk
    pub fn from_file(path: &Path, assets: SheetAssets, paper: PaperFormat) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(Self::new(std::fs::read_to_string(path)?, assets, paper))
    }

    pub fn new(source: String, assets: SheetAssets, paper: PaperFormat) -> Self {
        Self { source, assets, paper }
    }

    /// Build the complete document for one page of labels
    pub fn render(&self, fragment: &str) -> String {
        let content = format!(
            r#"<section class="sheet {}">{}</section>"#,
            self.paper.sheet_class(),
            fragment
        );

        // Order matters: assets go in before the content, so label text can never
        // be mistaken for a placeholder.
        let document = self
            .source
            .replacen(NORMALIZE_PLACEHOLDER, &self.assets.normalize_css, 1)
            .replacen(PAPER_CSS_PLACEHOLDER, &self.assets.paper_css, 1)
            .replacen(BARCODE_JS_PLACEHOLDER, &self.assets.barcode_js, 1)
            .replacen(CONTENT_PLACEHOLDER, &content, 1);

        let page_style = format!("<style>{}</style>", self.paper.page_css());
        let init_script = format!("<script>{}</script>", BARCODE_INIT_SCRIPT);

        let document = insert_before(document, "</head>", &page_style);
        insert_before(document, "</body>", &init_script)
    }
}

/// Insert `snippet` before the last `marker`, or append it when the marker is missing
fn insert_before(mut document: String, marker: &str, snippet: &str) -> String {
    match document.rfind(marker) {
        Some(at) => document.insert_str(at, snippet),
        None => document.push_str(snippet),
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> SheetAssets {
        SheetAssets {
            normalize_css: "/*normalize*/".to_string(),
            paper_css: "/*paper*/".to_string(),
            barcode_js: "/*jsbarcode*/".to_string(),
        }
    }

    #[test]
    fn test_builtin_has_all_placeholders() {
        for placeholder in [
            NORMALIZE_PLACEHOLDER,
            PAPER_CSS_PLACEHOLDER,
            BARCODE_JS_PLACEHOLDER,
            CONTENT_PLACEHOLDER,
        ] {
            assert!(BUILTIN_TEMPLATE.contains(placeholder), "missing {}", placeholder);
        }
    }

    #[test]
    fn test_render_substitutes_assets_and_content() {
        let template = DocumentTemplate::builtin(assets(), PaperFormat::Letter);
        let document = template.render("<div class=\"label\">A</div>");

        assert!(document.contains("/*normalize*/"));
        assert!(document.contains("/*paper*/"));
        assert!(document.contains("/*jsbarcode*/"));
        assert!(document.contains(r#"<section class="sheet letter"><div class="label">A</div></section>"#));
        assert!(!document.contains("INJECT_"));
    }

    #[test]
    fn test_render_replaces_first_occurrence_only() {
        let template = DocumentTemplate::new(
            "INJECT_CONTENT INJECT_CONTENT".to_string(),
            assets(),
            PaperFormat::Letter,
        );
        let document = template.render("x");
        assert!(document.starts_with(r#"<section class="sheet letter">x</section> INJECT_CONTENT"#));
    }

    #[test]
    fn test_render_injects_page_rule_and_barcode_init() {
        let template = DocumentTemplate::builtin(assets(), PaperFormat::A4);
        let document = template.render("");

        let init = document.find(BARCODE_INIT_SCRIPT).unwrap();
        let body_end = document.rfind("</body>").unwrap();
        assert!(init < body_end);
        assert!(document.find("@page").unwrap() < document.find("</head>").unwrap());
    }

    #[test]
    fn test_load_missing_assets() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = SheetAssets::load(dir.path());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }
}
