//! Domain models and business logic for identifier matching.
//!
//! This module holds everything that is about payroll statements rather than
//! about PDFs: statement kinds, identifier patterns, the unit roster and the
//! reporting period an output batch is filed under.

pub mod identifier;
pub mod period;
pub mod roster;
pub mod statement;

pub use identifier::{BankAccountMatcher, EsiNumberMatcher, UanMatcher};
pub use period::ReportingPeriod;
pub use roster::{Roster, RosterRow, UnitTarget};
pub use statement::StatementKind;

use regex::Regex;
use std::collections::HashSet;

/// Trait for identifier matching strategies.
pub trait IdentifierMatcher: Send + Sync {
    /// Anchored pattern a whole word must satisfy.
    fn pattern(&self) -> &Regex;

    /// Canonical spelling of a roster cell for this identifier.
    fn normalize(&self, cell: &str) -> String;

    /// Returns true if the word has the shape of this identifier.
    fn is_candidate(&self, word: &str) -> bool {
        self.pattern().is_match(word)
    }

    /// Returns true if the word is a candidate listed in `ids`.
    fn matches(&self, word: &str, ids: &HashSet<String>) -> bool {
        self.is_candidate(word) && ids.contains(word)
    }
}
