//! Matched and unmatched roster exports.
//!
//! Each unit gets two workbooks with the export columns of its statement
//! kind: rows whose identifier was found in the statements, and the rest.
//! The identifier column is written as text in its normalized spelling;
//! other numeric cells stay numeric.

use std::collections::BTreeSet;

use calamine::Data;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::domain::roster::{cell_text, Roster, RosterRow};
use crate::error::RedactorResult;

/// The two workbooks of a unit bundle.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub matched: Vec<u8>,
    pub unmatched: Vec<u8>,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
}

/// Writes a unit's matched and unmatched workbooks.
pub fn unit_report(
    roster: &Roster,
    unit: &str,
    matched_ids: &BTreeSet<String>,
) -> RedactorResult<UnitReport> {
    let (hit, miss) = roster.partition(unit, matched_ids);
    let sheets = roster.kind().export_sheet_names();

    Ok(UnitReport {
        matched: export_rows(roster, &hit, sheets.map(|(m, _)| m))?,
        unmatched: export_rows(roster, &miss, sheets.map(|(_, u)| u))?,
        matched_rows: hit.len(),
        unmatched_rows: miss.len(),
    })
}

/// Writes `rows` under the roster's export columns into a new workbook.
pub fn export_rows(
    roster: &Roster,
    rows: &[&RosterRow],
    sheet_name: Option<&str>,
) -> RedactorResult<Vec<u8>> {
    let columns = roster.export_columns();
    let id_column = roster.kind().id_column();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = sheet_name {
        worksheet.set_name(name)?;
    }

    for (col, (header, _)) in columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let out_row = row_idx as u32 + 1;
        for (col, (header, cell_idx)) in columns.iter().enumerate() {
            if *header == id_column {
                worksheet.write_string(out_row, col as u16, &row.identifier)?;
            } else if let Some(cell) = row.cells.get(*cell_idx) {
                write_cell(worksheet, out_row, col as u16, cell)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Data) -> RedactorResult<()> {
    match cell {
        Data::Empty => {}
        Data::Int(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        Data::Float(f) => {
            sheet.write_number(row, col, *f)?;
        }
        Data::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Data::String(s) => {
            sheet.write_string(row, col, s)?;
        }
        other => {
            sheet.write_string(row, col, cell_text(other))?;
        }
    }
    Ok(())
}
