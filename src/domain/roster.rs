//! Unit roster parsed from the uploaded spreadsheet.
//!
//! The roster maps every unit to the identifiers of its employees and keeps
//! the original rows so matched and unmatched employees can be exported with
//! their other columns intact.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};

use super::statement::{StatementKind, UNIT_COLUMN};
use crate::error::{RedactorError, RedactorResult};

/// One spreadsheet row.
#[derive(Debug, Clone)]
pub struct RosterRow {
    pub unit: String,
    pub identifier: String,
    /// Raw cells aligned with [`Roster::headers`].
    pub cells: Vec<Data>,
}

/// A unit and the identifiers that belong to it.
#[derive(Debug, Clone, Default)]
pub struct UnitTarget {
    pub name: String,
    /// Identifiers in roster order, duplicates included.
    pub identifiers: Vec<String>,
    lookup: HashSet<String>,
}

impl UnitTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_identifiers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.push(id.into());
        }
        self
    }

    fn push(&mut self, id: String) {
        self.lookup.insert(id.clone());
        self.identifiers.push(id);
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.lookup
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains(id)
    }
}

/// Identifier lookup for one statement kind.
#[derive(Debug, Clone)]
pub struct Roster {
    kind: StatementKind,
    headers: Vec<String>,
    rows: Vec<RosterRow>,
    units: Vec<UnitTarget>,
}

impl Roster {
    /// Reads the first worksheet of an `.xlsx`/`.xls` file.
    pub fn from_path(path: &Path, kind: StatementKind) -> RedactorResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes, kind)
    }

    /// Reads the first worksheet of an in-memory workbook.
    pub fn from_bytes(bytes: &[u8], kind: StatementKind) -> RedactorResult<Self> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| RedactorError::InvalidRoster {
                reason: "workbook has no worksheets".to_string(),
            })??;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|header| header.iter().map(|c| cell_text(c).trim().to_string()).collect())
            .unwrap_or_default();

        let body: Vec<Vec<Data>> = rows.map(|r| r.to_vec()).collect();
        Self::from_table(headers, body, kind)
    }

    /// Builds a roster from a header row and data rows.
    pub fn from_table(
        headers: Vec<String>,
        body: Vec<Vec<Data>>,
        kind: StatementKind,
    ) -> RedactorResult<Self> {
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (unit_idx, id_idx) = match (column(UNIT_COLUMN), column(kind.id_column())) {
            (Some(u), Some(i)) => (u, i),
            _ => {
                return Err(RedactorError::InvalidRoster {
                    reason: format!(
                        "the spreadsheet must contain '{}' and '{}' columns",
                        UNIT_COLUMN,
                        kind.id_column()
                    ),
                })
            }
        };

        let matcher = kind.matcher();
        let mut rows = Vec::with_capacity(body.len());
        let mut units: Vec<UnitTarget> = Vec::new();
        let mut unit_index: HashMap<String, usize> = HashMap::new();

        for mut cells in body {
            cells.resize(headers.len(), Data::Empty);
            let unit = cell_text(&cells[unit_idx]).trim().to_string();
            if unit.is_empty() {
                continue;
            }
            let identifier = matcher.normalize(&cell_text(&cells[id_idx]));

            let slot = *unit_index.entry(unit.clone()).or_insert_with(|| {
                units.push(UnitTarget::new(unit.clone()));
                units.len() - 1
            });
            units[slot].push(identifier.clone());

            rows.push(RosterRow {
                unit,
                identifier,
                cells,
            });
        }

        if units.is_empty() {
            return Err(RedactorError::InvalidRoster {
                reason: format!(
                    "no rows with both '{}' and '{}' values (mismatch file)",
                    UNIT_COLUMN,
                    kind.id_column()
                ),
            });
        }

        Ok(Self {
            kind,
            headers,
            rows,
            units,
        })
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Units in order of first appearance.
    pub fn units(&self) -> &[UnitTarget] {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&UnitTarget> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    /// Export columns present in this roster, with their cell index.
    pub fn export_columns(&self) -> Vec<(&'static str, usize)> {
        self.kind
            .export_columns()
            .into_iter()
            .filter_map(|name| {
                self.headers
                    .iter()
                    .position(|h| h == name)
                    .map(|idx| (name, idx))
            })
            .collect()
    }

    /// Splits a unit's rows by whether their identifier was found.
    pub fn partition<'a>(
        &'a self,
        unit: &str,
        matched: &BTreeSet<String>,
    ) -> (Vec<&'a RosterRow>, Vec<&'a RosterRow>) {
        self.rows
            .iter()
            .filter(|row| row.unit == unit)
            .partition(|row| matched.contains(&row.identifier))
    }
}

/// Text form of a cell with whole floats printed as integers.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
