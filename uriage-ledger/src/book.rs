//! The ledger book: a directory holding one grid CSV per calendar period.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::grid::{sheet_name, LedgerError, LedgerGrid};

#[derive(Debug, Clone)]
pub struct LedgerBook {
    dir: PathBuf,
}

impl LedgerBook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for the period containing `date`.
    pub fn period_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.csv", sheet_name(date.year(), date.month())))
    }

    /// Open the grid for `date`'s period. A missing file means the period's
    /// ledger has not been created, which skips the block rather than
    /// aborting the run.
    pub fn open(&self, date: NaiveDate) -> Result<LedgerGrid, LedgerError> {
        let path = self.period_path(date);
        if !path.exists() {
            return Err(LedgerError::TargetPeriodMissing(sheet_name(
                date.year(),
                date.month(),
            )));
        }
        debug!("opening ledger {}", path.display());
        LedgerGrid::load(&path, date.year(), date.month())
    }

    /// Write a grid back to its period file.
    pub fn save(&self, grid: &LedgerGrid) -> Result<(), LedgerError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", grid.name()));
        grid.save(&path)
    }
}
