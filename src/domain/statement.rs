//! Statement kinds and their naming conventions.
//!
//! A statement kind decides which roster column holds the identifier, what a
//! candidate word looks like, how output files are named and which storage
//! folder the archive copy lands in.

use std::fmt;
use std::str::FromStr;

use super::identifier::{BankAccountMatcher, EsiNumberMatcher, UanMatcher};
use super::IdentifierMatcher;
use crate::error::RedactorError;

/// Roster columns shared by every export, in output order.
const COMMON_EXPORT_COLUMNS: [&str; 7] = [
    "SNO", "EMP CODE", "EMP NAME", "BRANCH", "BRANCH 1", "UNIT", "STATE",
];

/// Roster column naming the unit a row belongs to.
pub const UNIT_COLUMN: &str = "UNIT";

/// The three statement families handled by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    /// Salary transfer statements keyed by bank account number
    Bank,
    /// Provident-fund returns keyed by UAN
    Pf,
    /// Employee State Insurance challans keyed by ESI number
    Esic,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [Self::Bank, Self::Pf, Self::Esic];

    /// Roster column holding the identifier.
    pub fn id_column(self) -> &'static str {
        match self {
            Self::Bank => "BANK_ACC_NO",
            Self::Pf => "PF UAN",
            Self::Esic => "ESINO",
        }
    }

    /// Matcher deciding which page words are identifiers of this kind.
    pub fn matcher(self) -> &'static dyn IdentifierMatcher {
        static BANK: BankAccountMatcher = BankAccountMatcher;
        static PF: UanMatcher = UanMatcher;
        static ESIC: EsiNumberMatcher = EsiNumberMatcher;
        match self {
            Self::Bank => &BANK,
            Self::Pf => &PF,
            Self::Esic => &ESIC,
        }
    }

    /// Columns copied into the matched/unmatched exports, when present.
    pub fn export_columns(self) -> Vec<&'static str> {
        let specific: &[&str] = match self {
            Self::Bank => &["BANK_ACC_NO", "BANKREFNO"],
            Self::Pf => &["PFNO", "PF UAN"],
            Self::Esic => &["ESINO"],
        };
        COMMON_EXPORT_COLUMNS
            .iter()
            .chain(specific)
            .copied()
            .collect()
    }

    /// Worksheet names for the matched and unmatched exports.
    ///
    /// `None` keeps the writer's default sheet name.
    pub fn export_sheet_names(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Bank => Some(("Matched", "Unmatched")),
            Self::Pf | Self::Esic => None,
        }
    }

    /// Name of the redacted PDF inside a unit bundle.
    pub fn pdf_entry_name(self, unit: &str) -> String {
        match self {
            Self::Bank => format!("{unit}_Bank.pdf"),
            Self::Pf => format!("{unit}_PF.pdf"),
            Self::Esic => format!("{unit}_ESINO.pdf"),
        }
    }

    pub fn matched_entry_name(self, unit: &str) -> String {
        match self {
            Self::Pf => format!("{unit}_Match.xlsx"),
            Self::Bank | Self::Esic => format!("{unit}_Matched.xlsx"),
        }
    }

    pub fn unmatched_entry_name(self, unit: &str) -> String {
        match self {
            Self::Pf => format!("{unit}_Unmatch.xlsx"),
            Self::Bank | Self::Esic => format!("{unit}_Unmatched.xlsx"),
        }
    }

    /// Name of a unit's zip inside the master archive.
    pub fn unit_archive_name(self, unit: &str) -> String {
        match self {
            Self::Bank => format!("{unit}_Bank.zip"),
            Self::Pf => format!("{unit}_PF.zip"),
            Self::Esic => format!("{unit}.zip"),
        }
    }

    /// Top-level storage folder, with trailing slash.
    pub fn storage_folder(self) -> &'static str {
        match self {
            Self::Bank => "Bank/",
            Self::Pf => "PF/",
            Self::Esic => "ESIC/",
        }
    }

    /// Object name of the redacted PDF in the storage archive.
    pub fn storage_pdf_name(self, unit: &str) -> String {
        match self {
            Self::Pf => format!("{unit}_Processed.pdf"),
            Self::Bank | Self::Esic => self.pdf_entry_name(unit),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bank => "Bank",
            Self::Pf => "PF",
            Self::Esic => "ESIC",
        };
        f.write_str(name)
    }
}

impl FromStr for StatementKind {
    type Err = RedactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bank" => Ok(Self::Bank),
            "pf" => Ok(Self::Pf),
            "esic" | "esi" => Ok(Self::Esic),
            other => Err(RedactorError::invalid_input(
                "kind",
                format!("unknown statement kind '{other}' (expected bank, pf or esic)"),
            )),
        }
    }
}
