//! Which pages of a statement go into a unit's document.

use super::PageSelection;

/// Returns true if page `index` of a `page_count`-page document is kept.
///
/// The first and last pages carry the statement's heading and totals, so
/// relevant-page mode keeps them even without a match.
pub fn keep_page(
    selection: PageSelection,
    index: usize,
    page_count: usize,
    has_match: bool,
) -> bool {
    match selection {
        PageSelection::All => true,
        PageSelection::Relevant => has_match || index == 0 || index + 1 == page_count,
    }
}

/// Zero-based indices kept out of `matches`, one flag per page.
pub fn select_pages(selection: PageSelection, matches: &[bool]) -> Vec<usize> {
    matches
        .iter()
        .enumerate()
        .filter(|&(index, &has_match)| keep_page(selection, index, matches.len(), has_match))
        .map(|(index, _)| index)
        .collect()
}
