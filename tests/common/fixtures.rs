//! Test fixtures: statement PDFs and roster spreadsheets.
//!
//! Statements are laid out in PDF points from the top-left corner, the same
//! space the word extractor reports, so tests can place identifiers in a
//! specific header, content or footer band.

use anyhow::Result;
use printpdf::*;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};

/// A4 page size in points.
pub const PAGE_WIDTH_PT: f32 = 595.0;
pub const PAGE_HEIGHT_PT: f32 = 842.0;

const FONT_SIZE: f32 = 11.0;

#[derive(Debug, Clone)]
struct TextItem {
    x: f32,
    baseline: f32,
    text: String,
}

/// Builder for multi-page statements with positioned text.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let bytes = StatementPdfBuilder::new()
///     .text(40.0, 60.0, "ESIC CHALLAN North")
///     .text(40.0, 400.0, "1 2100123456 Asha")
///     .page()
///     .text(40.0, 400.0, "2 2100999999 Meena")
///     .to_bytes()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StatementPdfBuilder {
    title: String,
    pages: Vec<Vec<TextItem>>,
}

impl StatementPdfBuilder {
    /// Creates a builder with one empty page.
    pub fn new() -> Self {
        Self {
            title: "Statement".to_string(),
            pages: vec![Vec::new()],
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Starts a new page.
    pub fn page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Writes `text` with its baseline `baseline` points below the page top.
    pub fn text(mut self, x: f32, baseline: f32, text: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(TextItem {
                x,
                baseline,
                text: text.to_string(),
            });
        }
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Renders the statement to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let width = Mm::from(Pt(PAGE_WIDTH_PT));
        let height = Mm::from(Pt(PAGE_HEIGHT_PT));
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, width, height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        for (idx, items) in self.pages.iter().enumerate() {
            let (page, layer) = if idx == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(width, height, format!("Layer {}", idx + 1))
            };
            let layer = doc.get_page(page).get_layer(layer);
            for item in items {
                layer.use_text(
                    item.text.clone(),
                    FONT_SIZE,
                    Mm::from(Pt(item.x)),
                    Mm::from(Pt(PAGE_HEIGHT_PT - item.baseline)),
                    &font,
                );
            }
        }

        Ok(doc.save_to_bytes()?)
    }

    /// Renders the statement into `path`.
    pub fn build(&self, path: &Path) -> Result<PathBuf> {
        fs::write(path, self.to_bytes()?)?;
        Ok(path.to_path_buf())
    }
}

impl Default for StatementPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for roster workbooks.
///
/// Cells made only of digits without a leading zero are written as numbers,
/// like a spreadsheet program would store them.
#[derive(Debug, Clone, Default)]
pub struct RosterBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RosterBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string(0, col as u16, header)?;
        }
        for (row_idx, row) in self.rows.iter().enumerate() {
            let row_no = row_idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let numeric = cell.chars().all(|c| c.is_ascii_digit()) && !cell.starts_with('0');
                match cell.parse::<f64>() {
                    Ok(number) if numeric => sheet.write_number(row_no, col as u16, number)?,
                    _ => sheet.write_string(row_no, col as u16, cell)?,
                };
            }
        }
        Ok(workbook.save_to_buffer()?)
    }

    pub fn build(&self, path: &Path) -> Result<PathBuf> {
        fs::write(path, self.to_bytes()?)?;
        Ok(path.to_path_buf())
    }
}

/// ESIC roster: North owns two numbers, South one, East none present.
pub fn esic_roster() -> RosterBuilder {
    RosterBuilder::new(&["SNO", "EMP CODE", "EMP NAME", "UNIT", "ESINO", "REMARKS"])
        .row(&["1", "E01", "Asha", "North", "2100123456", "ok"])
        .row(&["2", "E02", "Ravi", "North", "2100123457", "ok"])
        .row(&["3", "E03", "Meena", "South", "2100999999", "ok"])
        .row(&["4", "E04", "Kiran", "East", "2100555555", "ok"])
}

/// Three-page ESIC challan matching [`esic_roster`].
///
/// Page 1 lists North's Asha plus an unknown number, page 2 lists South's
/// Meena, page 3 only carries totals.
pub fn esic_statement() -> StatementPdfBuilder {
    StatementPdfBuilder::new()
        .with_title("ESIC Challan")
        .text(40.0, 60.0, "ESIC MONTHLY CONTRIBUTION North South")
        .text(40.0, 300.0, "1 2100123456 Asha 21000")
        .text(40.0, 340.0, "2 2100888888 Unknown 18000")
        .page()
        .text(40.0, 300.0, "3 2100999999 Meena 19000")
        .page()
        .text(40.0, 300.0, "TOTAL 58000")
}

/// Bank roster keyed by account number; leading zeros kept as text.
pub fn bank_roster() -> RosterBuilder {
    RosterBuilder::new(&["SNO", "EMP NAME", "UNIT", "BANK_ACC_NO", "BANKREFNO"])
        .row(&["1", "Asha", "North", "000123456789", "R1"])
        .row(&["2", "Ravi", "North", "555000111", "R2"])
        .row(&["3", "Meena", "South", "777888999", "R3"])
}

/// One-page bank statement with a header, three transactions and a footer.
pub fn bank_statement() -> StatementPdfBuilder {
    StatementPdfBuilder::new()
        .with_title("Salary Transfer")
        .text(40.0, 60.0, "SALARY TRANSFER STATEMENT North")
        .text(40.0, 100.0, "Account 000123456789")
        .text(40.0, 400.0, "1 000123456789 Asha 21000")
        .text(40.0, 440.0, "2 999999999 Unknown 18000")
        .text(40.0, 480.0, "3 777888999 Meena 19000")
        .text(40.0, 830.0, "Page 1 of 1")
}

/// PF roster: North owns two UANs, South one.
pub fn pf_roster() -> RosterBuilder {
    RosterBuilder::new(&["SNO", "EMP NAME", "UNIT", "PFNO", "PF UAN"])
        .row(&["1", "Asha", "North", "PF/001", "100200300400"])
        .row(&["2", "Ravi", "North", "PF/002", "100200300401"])
        .row(&["3", "Meena", "South", "PF/003", "100200300500"])
}

/// Two-page PF return; each member block ends with its UAN near the bottom.
///
/// Page 1 carries North's Asha, page 2 South's Meena and an unknown member.
pub fn pf_statement() -> StatementPdfBuilder {
    StatementPdfBuilder::new()
        .with_title("PF Return")
        .text(40.0, 60.0, "ELECTRONIC CHALLAN CUM RETURN")
        .text(40.0, 760.0, "1 100200300400 Asha 1800")
        .page()
        .text(40.0, 700.0, "2 100200300500 Meena 1800")
        .text(300.0, 760.0, "3 100200300999 Unknown 1800")
}
