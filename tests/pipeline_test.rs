//! End-to-end tests of the batch pipeline on generated statements.
//!
//! Statements are rendered with printpdf and rosters with rust_xlsxwriter,
//! then run through extraction, annotation, merging and packaging.

mod common;

use anyhow::Result;
use calamine::Data;
use chrono::NaiveDate;
use common::*;
use std::collections::BTreeSet;

use unit_redactor::output::read_entries;
use unit_redactor::{
    run_batch, BatchRequest, MaskingMode, PageSelection, ProcessingOptions, RedactionService,
    RedactorError, ReportingPeriod, Roster, StatementKind, Upload,
};

fn period() -> ReportingPeriod {
    let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    ReportingPeriod::parse("Mar", 2025, today).unwrap()
}

fn options(mode: MaskingMode, pages: PageSelection) -> ProcessingOptions {
    ProcessingOptions {
        mode,
        pages,
        workers: 2,
    }
}

fn request(
    roster: &RosterBuilder,
    kind: StatementKind,
    statements: &[(&str, &StatementPdfBuilder)],
    options: ProcessingOptions,
) -> Result<BatchRequest> {
    let roster = Roster::from_bytes(&roster.to_bytes()?, kind)?;
    let mut uploads = Vec::new();
    for (name, statement) in statements {
        uploads.push(Upload::new(*name, statement.to_bytes()?));
    }
    Ok(BatchRequest {
        roster,
        uploads,
        options,
        period: period(),
    })
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_roster_round_trips_through_workbook() -> Result<()> {
    let roster = Roster::from_bytes(&esic_roster().to_bytes()?, StatementKind::Esic)?;

    let units: Vec<&str> = roster.units().iter().map(|u| u.name.as_str()).collect();
    assert_eq!(units, ["North", "South", "East"]);
    assert!(roster.unit("North").unwrap().contains("2100123457"));
    assert_eq!(roster.rows().len(), 4);
    Ok(())
}

#[test]
fn test_statement_words_are_extracted() -> Result<()> {
    let bytes = esic_statement().to_bytes()?;
    let words = page_words(&bytes)?;

    assert_eq!(words.len(), 3);
    assert!(words[0].iter().any(|w| w == "2100123456"));
    assert!(words[1].iter().any(|w| w == "2100999999"));
    Ok(())
}

#[test]
fn test_esic_all_pages_keeps_every_page_per_unit() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        options(MaskingMode::Highlight, PageSelection::All),
    )?;

    let outcome = run_batch(&req)?;

    let units: Vec<&str> = outcome.bundles.iter().map(|b| b.unit.as_str()).collect();
    assert_eq!(units, ["North", "South"], "East has no match and gets no bundle");
    for bundle in &outcome.bundles {
        assert_pdf_pages(&bundle.pdf, 3);
    }
    assert_eq!(outcome.bundles[0].matched_ids, ids(&["2100123456"]));
    assert_eq!(outcome.bundles[1].matched_ids, ids(&["2100999999"]));

    assert_eq!(outcome.stats.documents, 1);
    assert_eq!(outcome.stats.pages, 3);
    assert_eq!(outcome.stats.highlights, 2);
    assert_eq!(outcome.stats.masks, 0);
    Ok(())
}

#[test]
fn test_esic_relevant_pages_keeps_first_last_and_matching() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        options(MaskingMode::Highlight, PageSelection::Relevant),
    )?;

    let outcome = run_batch(&req)?;

    // North matches on the first page only, South on the middle one.
    assert_pdf_pages(&outcome.bundles[0].pdf, 2);
    assert_pdf_pages(&outcome.bundles[1].pdf, 3);
    Ok(())
}

#[test]
fn test_esic_highlights_land_on_matching_page() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        options(MaskingMode::Highlight, PageSelection::All),
    )?;

    let outcome = run_batch(&req)?;
    let north = annotations_per_page(&outcome.bundles[0].pdf)?;

    // Highlight plus the blue unit label in the header.
    assert_eq!(north, [2, 0, 0]);
    Ok(())
}

#[test]
fn test_esic_mask_mode_covers_other_identifiers() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        options(MaskingMode::Mask, PageSelection::All),
    )?;

    let outcome = run_batch(&req)?;

    // Every unit sees the three identifiers; only its own stay revealed.
    // East gets no bundle but its pages were still annotated.
    assert_eq!(outcome.stats.highlights, 2);
    assert_eq!(outcome.stats.masks, 7);

    let north = annotations_per_page(&outcome.bundles[0].pdf)?;
    assert_eq!(north, [3, 1, 0]);
    Ok(())
}

#[test]
fn test_bundle_archive_layout() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        ProcessingOptions::default(),
    )?;

    let outcome = run_batch(&req)?;
    assert_eq!(outcome.archive_name(), "Mar-2025.zip");

    let master = outcome.master_archive()?;
    assert_entries(&master, &["North.zip", "South.zip"]);

    let units = read_entries(&master)?;
    let north = entry(&units, "North.zip");
    assert_entries(
        north,
        &["North_ESINO.pdf", "North_Matched.xlsx", "North_Unmatched.xlsx"],
    );
    Ok(())
}

#[test]
fn test_matched_and_unmatched_exports() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        ProcessingOptions::default(),
    )?;

    let outcome = run_batch(&req)?;
    let north = &outcome.bundles[0];

    // Exports keep the UNIT and ESINO columns, so they read back as rosters.
    let matched = Roster::from_bytes(&north.matched, StatementKind::Esic)?;
    let matched_ids: Vec<&str> = matched.rows().iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(matched_ids, ["2100123456"]);

    let unmatched = Roster::from_bytes(&north.unmatched, StatementKind::Esic)?;
    let unmatched_ids: Vec<&str> = unmatched.rows().iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(unmatched_ids, ["2100123457"]);
    assert!(unmatched.headers().iter().any(|h| h == "EMP NAME"));
    assert!(!unmatched.headers().iter().any(|h| h == "REMARKS"));
    Ok(())
}

#[test]
fn test_uploads_fan_in_per_unit() -> Result<()> {
    let first = esic_statement();
    let second = StatementPdfBuilder::new().text(40.0, 300.0, "1 2100123457 Ravi 20000");
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("first.pdf", &first), ("second.pdf", &second)],
        options(MaskingMode::Highlight, PageSelection::Relevant),
    )?;

    let outcome = run_batch(&req)?;

    let north = &outcome.bundles[0];
    assert_eq!(north.unit, "North");
    assert_eq!(north.matched_ids, ids(&["2100123456", "2100123457"]));
    assert_pdf_pages(&north.pdf, 3);
    assert_eq!(outcome.stats.documents, 2);
    assert_eq!(outcome.stats.pages, 4);
    Ok(())
}

#[test]
fn test_no_match_fails_the_batch() -> Result<()> {
    let roster = RosterBuilder::new(&["UNIT", "ESINO"]).row(&["West", "2100000001"]);
    let statement = esic_statement();
    let req = request(
        &roster,
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        ProcessingOptions::default(),
    )?;

    let err = run_batch(&req).unwrap_err();
    assert!(matches!(err, RedactorError::NoMatch { documents: 1, units: 1 }));
    Ok(())
}

#[test]
fn test_duplicate_content_is_rejected() -> Result<()> {
    let statement = esic_statement();
    let req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("a.pdf", &statement), ("b.pdf", &statement)],
        ProcessingOptions::default(),
    )?;

    let err = run_batch(&req).unwrap_err();
    assert!(matches!(err, RedactorError::DuplicateUpload { ref name, .. } if name == "b.pdf"));
    Ok(())
}

#[test]
fn test_empty_batch_and_zero_workers_are_rejected() -> Result<()> {
    let statement = esic_statement();
    let mut req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[("challan.pdf", &statement)],
        options(MaskingMode::Highlight, PageSelection::All),
    )?;

    req.options.workers = 0;
    assert!(matches!(run_batch(&req), Err(RedactorError::InvalidInput { .. })));

    req.options.workers = 1;
    req.uploads.clear();
    assert!(matches!(run_batch(&req), Err(RedactorError::InvalidInput { .. })));
    Ok(())
}

#[test]
fn test_corrupt_upload_names_the_file() -> Result<()> {
    let mut req = request(
        &esic_roster(),
        StatementKind::Esic,
        &[],
        ProcessingOptions::default(),
    )?;
    req.uploads.push(Upload::new("broken.pdf", b"%PDF-1.4 not really".to_vec()));

    let err = run_batch(&req).unwrap_err();
    assert!(err.to_string().contains("broken.pdf"), "got: {err}");
    Ok(())
}

#[test]
fn test_cropped_pages_keep_masks_on_their_text() -> Result<()> {
    // Crop 30pt from the left and 42pt from the top of every page.
    let bytes = with_crop_box(&esic_statement().to_bytes()?, [30.0, 0.0, 595.0, 800.0])?;
    let roster = Roster::from_bytes(&esic_roster().to_bytes()?, StatementKind::Esic)?;
    let req = BatchRequest {
        roster,
        uploads: vec![Upload::new("cropped.pdf", bytes)],
        options: options(MaskingMode::Mask, PageSelection::All),
        period: period(),
    };

    let outcome = run_batch(&req)?;
    let north = annotation_rects(&outcome.bundles[0].pdf)?;

    // Baselines 300 and 340 from the top of the MediaBox sit at user y 542
    // and 502; glyphs reach a few points above them.
    assert!(covers(&north[0], 150.0, 546.0), "reveal misses Asha's line: {north:?}");
    assert!(covers(&north[0], 150.0, 506.0), "mask misses the unknown line: {north:?}");
    Ok(())
}

#[test]
fn test_pf_batch_bundles_and_exports() -> Result<()> {
    let statement = pf_statement();
    let req = request(
        &pf_roster(),
        StatementKind::Pf,
        &[("return.pdf", &statement)],
        ProcessingOptions::default(),
    )?;

    let outcome = run_batch(&req)?;

    let units: Vec<&str> = outcome.bundles.iter().map(|b| b.unit.as_str()).collect();
    assert_eq!(units, ["North", "South"]);
    assert_eq!(outcome.bundles[0].matched_ids, ids(&["100200300400"]));
    assert_eq!(outcome.bundles[1].matched_ids, ids(&["100200300500"]));

    // Masking is the default: every other UAN is covered, no unit labels.
    assert_eq!(outcome.stats.highlights, 2);
    assert_eq!(outcome.stats.masks, 4);
    assert_eq!(annotations_per_page(&outcome.bundles[0].pdf)?, [1, 2]);

    let master = outcome.master_archive()?;
    assert_entries(&master, &["North_PF.zip", "South_PF.zip"]);
    let units = read_entries(&master)?;
    let north_zip = entry(&units, "North_PF.zip");
    assert_entries(
        north_zip,
        &["North_PF.pdf", "North_Match.xlsx", "North_Unmatch.xlsx"],
    );

    let north = read_entries(north_zip)?;
    let unmatched = Roster::from_bytes(entry(&north, "North_Unmatch.xlsx"), StatementKind::Pf)?;
    let uan_col = unmatched
        .headers()
        .iter()
        .position(|h| h == "PF UAN")
        .expect("PF UAN column exported");
    let row = &unmatched.rows()[0];
    assert_eq!(row.identifier, "100200300401");
    assert_eq!(row.cells[uan_col], Data::String("100200300401".to_string()));
    Ok(())
}

#[test]
fn test_bank_rows_are_highlighted() -> Result<()> {
    let statement = bank_statement();
    let req = request(
        &bank_roster(),
        StatementKind::Bank,
        &[("salary.pdf", &statement)],
        options(MaskingMode::Highlight, PageSelection::All),
    )?;

    let outcome = run_batch(&req)?;

    let units: Vec<&str> = outcome.bundles.iter().map(|b| b.unit.as_str()).collect();
    assert_eq!(units, ["North", "South"]);
    // Leading zeros are part of the account number.
    assert_eq!(outcome.bundles[0].matched_ids, ids(&["000123456789"]));
    assert_eq!(outcome.bundles[1].matched_ids, ids(&["777888999"]));
    assert_eq!(outcome.stats.masks, 0);

    let master = outcome.master_archive()?;
    assert_entries(&master, &["North_Bank.zip", "South_Bank.zip"]);
    Ok(())
}

#[test]
fn test_bank_mask_covers_other_content_rows_only() -> Result<()> {
    let statement = bank_statement();
    let req = request(
        &bank_roster(),
        StatementKind::Bank,
        &[("salary.pdf", &statement)],
        options(MaskingMode::Mask, PageSelection::All),
    )?;

    let outcome = run_batch(&req)?;

    // Three transaction rows per unit, one highlighted; header and footer
    // rows are never masked.
    assert_eq!(outcome.stats.masks, 4);
    Ok(())
}

#[test]
fn test_service_reports_units_without_matches() -> Result<()> {
    let roster = Roster::from_bytes(&esic_roster().to_bytes()?, StatementKind::Esic)?;
    let service = RedactionService::for_roster(
        &roster,
        options(MaskingMode::Highlight, PageSelection::Relevant),
    );

    let outcome = service.process_document(&esic_statement().to_bytes()?, &roster)?;

    assert_eq!(outcome.pages, 3);
    let east = outcome
        .units
        .iter()
        .find(|u| u.unit == "East")
        .expect("East keeps its first and last pages");
    assert!(east.matched.is_empty());
    assert_eq!(east.document.get_pages().len(), 2);
    Ok(())
}
