//! uriage-ledger: the per-period ledger grid and the reconciliation engine
//! that writes ordered report blocks into it.

pub mod book;
pub mod grid;
pub mod reconcile;

pub use book::LedgerBook;
pub use grid::{sheet_name, LedgerError, LedgerGrid};
pub use reconcile::{
    reconcile, ConflictPolicy, Decision, Operator, ReconcileReport, RunAbort, Unattended,
};
