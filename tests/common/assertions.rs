//! Custom assertions for bundle and archive testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use unit_redactor::output::read_entries;

use super::pdf_helpers::{is_valid_pdf, page_count};

/// Names of the entries of a zip, in archive order.
pub fn entry_names(zip: &[u8]) -> Vec<String> {
    read_entries(zip)
        .expect("Failed to read zip")
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Content of the entry called `name`.
///
/// # Panics
/// Panics if the zip has no such entry.
pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, bytes)| bytes.as_slice())
        .unwrap_or_else(|| {
            let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
            panic!("Entry '{name}' not found, archive holds {names:?}")
        })
}

/// Asserts that a zip holds exactly the given entries, in any order.
///
/// # Panics
/// Panics if the entry names differ.
pub fn assert_entries(zip: &[u8], expected: &[&str]) {
    let mut names = entry_names(zip);
    names.sort();
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(names, expected, "Archive entries differ");
}

/// Asserts that `bytes` is a loadable PDF with `pages` pages.
///
/// # Panics
/// Panics if the PDF is invalid or has a different page count.
pub fn assert_pdf_pages(bytes: &[u8], pages: usize) {
    assert!(is_valid_pdf(bytes), "Output should be a valid PDF");
    let actual = page_count(bytes).expect("Failed to count pages");
    assert_eq!(
        actual, pages,
        "PDF should have {pages} page(s) but has {actual}"
    );
}
