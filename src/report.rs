//! Chart-report records and the tab-delimited writer.
//!
//! The header is written unconditionally, so an empty report produces a
//! header-only file. Gene-ID lists can carry arbitrary text; the csv writer
//! quotes any field containing a tab, quote, or line break instead of
//! emitting a row that no longer splits into 13 columns. There is no
//! cleanup on a mid-write failure: a truncated file may remain, and the
//! failed attempt is retried as a whole.

use crate::error::RunError;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::path::Path;

/// Column order matches the field order of [`ChartRecord`].
pub const REPORT_HEADER: [&str; 13] = [
    "Category",
    "Term",
    "Count",
    "%",
    "Pvalue",
    "Genes",
    "List Total",
    "Pop Hits",
    "Pop Total",
    "Fold Enrichment",
    "Bonferroni",
    "Benjamini",
    "FDR",
];

/// One enriched term, exactly as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    pub category_name: String,
    pub term_name: String,
    pub list_hits: u32,
    pub percent: f64,
    pub ease: f64,
    pub gene_ids: String,
    pub list_totals: u32,
    pub pop_hits: u32,
    pub pop_totals: u32,
    pub fold_enrichment: f64,
    pub bonferroni: f64,
    pub benjamini: f64,
    pub fdr: f64,
}

/// Write header + one row per record, truncating any existing file.
pub fn write_report(path: &Path, records: &[ChartRecord]) -> Result<(), RunError> {
    let wrap = |source: csv::Error| RunError::ReportWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Necessary)
        .has_headers(false)
        .from_path(path)
        .map_err(wrap)?;
    writer.write_record(REPORT_HEADER).map_err(wrap)?;
    for record in records {
        writer.serialize(record).map_err(wrap)?;
    }
    writer.flush().map_err(|source| RunError::ReportWrite {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    Ok(())
}
