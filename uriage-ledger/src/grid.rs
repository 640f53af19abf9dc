//! The per-period ledger grid: a CSV-backed wide table of store/item rows
//! against date columns.
//!
//! Layout contract: column 0 holds the canonical store id, column 1 the item
//! label, columns 2+ one cell per calendar day with the date in the header
//! row. Lookups run against indexes built once at load; match semantics are
//! exact label equality and date equality after stripping time-of-day.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use log::debug;
use thiserror::Error;

use uriage_core::{parse_header_date, StoreNotFound};

/// First data column (after store id and item label).
const DATE_COL_START: usize = 2;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no ledger for period {0}")]
    TargetPeriodMissing(String),
    #[error(transparent)]
    StoreNotFound(#[from] StoreNotFound),
    #[error("no column for date {0}")]
    DateColumnNotFound(NaiveDate),
    #[error("ledger io: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger csv: {0}")]
    Csv(#[from] csv::Error),
}

/// One period's grid, loaded in full and saved back in full.
#[derive(Debug, Clone)]
pub struct LedgerGrid {
    pub period_year: i32,
    pub period_month: u32,
    rows: Vec<Vec<String>>,
    /// Header column index per parsed date.
    date_cols: Vec<(NaiveDate, usize)>,
}

/// Sheet/file stem for a period: `yy` + zero-padded `mm` + the fixed suffix.
pub fn sheet_name(year: i32, month: u32) -> String {
    format!("{:02}{:02}月_売上", year % 100, month)
}

impl LedgerGrid {
    /// Build a grid from raw rows (the first row is the header).
    pub fn from_rows(period_year: i32, period_month: u32, rows: Vec<Vec<String>>) -> Self {
        let date_cols = index_header(&rows, period_year);
        Self {
            period_year,
            period_month,
            rows,
            date_cols,
        }
    }

    pub fn load(path: &Path, period_year: i32, period_month: u32) -> Result<Self, LedgerError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::from_rows(period_year, period_month, rows))
    }

    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Item-label → row index for a canonical store id.
    ///
    /// Exact match on column 0 first; when nothing matches, the same
    /// unique-substring fallback as store resolution runs against the
    /// distinct row labels before giving up.
    pub fn store_rows(&self, canonical: &str) -> Result<HashMap<String, usize>, LedgerError> {
        let collect = |wanted: &str| -> HashMap<String, usize> {
            let mut out = HashMap::new();
            for (i, row) in self.rows.iter().enumerate() {
                if row.first().map(|s| s.trim()) == Some(wanted) {
                    if let Some(label) = row.get(1) {
                        out.insert(label.trim().to_string(), i);
                    }
                }
            }
            out
        };

        let exact = collect(canonical);
        if !exact.is_empty() {
            return Ok(exact);
        }

        let mut candidates: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(|s| s.trim().to_string())
            .filter(|label| !label.is_empty() && label.contains(canonical))
            .collect();
        candidates.sort();
        candidates.dedup();

        if let [only] = candidates.as_slice() {
            debug!("row-label fallback: {canonical} -> {only}");
            return Ok(collect(only));
        }
        Err(LedgerError::StoreNotFound(StoreNotFound {
            raw: canonical.to_string(),
            normalized: canonical.to_string(),
            candidates,
        }))
    }

    /// Header column holding `date`; first match wins.
    pub fn date_column(&self, date: NaiveDate) -> Result<usize, LedgerError> {
        self.date_cols
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, col)| *col)
            .ok_or(LedgerError::DateColumnNotFound(date))
    }

    /// The data column immediately before `col`, if it exists.
    pub fn previous_column(&self, col: usize) -> Option<usize> {
        (col > DATE_COL_START).then(|| col - 1)
    }

    /// Numeric value of a cell; empty or missing reads as `None`.
    pub fn cell_number(&self, row: usize, col: usize) -> Option<i64> {
        let cell = self.rows.get(row)?.get(col)?.trim();
        if cell.is_empty() {
            return None;
        }
        cell.replace(',', "").parse().ok()
    }

    /// Whether a cell holds existing data for duplicate detection: any
    /// non-empty value except a literal zero counts.
    pub fn cell_occupied(&self, row: usize, col: usize) -> bool {
        let Some(row_vec) = self.rows.get(row) else {
            return false;
        };
        let Some(cell) = row_vec.get(col) else {
            return false;
        };
        let cell = cell.trim();
        if cell.is_empty() {
            return false;
        }
        match cell.replace(',', "").parse::<i64>() {
            Ok(n) => n != 0,
            // Non-numeric content still blocks a silent overwrite.
            Err(_) => true,
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: u64) {
        if let Some(row_vec) = self.rows.get_mut(row) {
            if row_vec.len() <= col {
                row_vec.resize(col + 1, String::new());
            }
            row_vec[col] = value.to_string();
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

fn index_header(rows: &[Vec<String>], period_year: i32) -> Vec<(NaiveDate, usize)> {
    let Some(header) = rows.first() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (col, cell) in header.iter().enumerate().skip(DATE_COL_START) {
        if let Some(date) = parse_header_date(cell, period_year) {
            // First match wins per date.
            if !out.iter().any(|(d, _): &(NaiveDate, usize)| *d == date) {
                out.push((date, col));
            }
        }
    }
    out
}

/// Convenience for building test and fixture grids: a header of contiguous
/// days plus `(store, item)` rows.
pub fn month_grid(year: i32, month: u32, days: u32, rows: &[(&str, &str)]) -> LedgerGrid {
    let mut header = vec!["店舗".to_string(), "項目".to_string()];
    for day in 1..=days {
        header.push(format!("{}/{:02}/{:02}", year, month, day));
    }
    let mut all = vec![header];
    for (store, item) in rows {
        let mut row = vec![store.to_string(), item.to_string()];
        row.resize(2 + days as usize, String::new());
        all.push(row);
    }
    LedgerGrid::from_rows(year, month, all)
}

impl LedgerGrid {
    /// Period tag of this grid, e.g. `2507月_売上`.
    pub fn name(&self) -> String {
        sheet_name(self.period_year, self.period_month)
    }

    /// Whether `date` falls inside this grid's period.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date.year() == self.period_year && date.month() == self.period_month
    }
}
