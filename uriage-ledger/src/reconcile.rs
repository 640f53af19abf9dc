//! The reconciliation engine: duplicate and anomaly checks, then cell
//! commits, over a run of ordered blocks.
//!
//! Batch and interactive behavior share this one engine, parameterized by
//! [`ConflictPolicy`]; the operator sits behind a trait so the CLI can wire
//! real prompts and tests can script decisions. Blocks already committed
//! stay committed when a later block aborts the run.

use chrono::NaiveDate;
use log::{info, warn};

use uriage_core::{Block, ItemKind, PipelineConfig};

use crate::book::LedgerBook;
use crate::grid::LedgerError;

/// Items checked by the duplicate-date and previous-day rules.
const PRIMARY_ITEMS: [ItemKind; 2] = [ItemKind::Revenue, ItemKind::Purchase];

/// What to do when the target cell already holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Overwrite and log (batch runs).
    AutoOverwrite,
    /// Ask the operator; declining aborts the remaining run.
    PromptOperator,
}

/// Operator answer to a per-block confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
    Abort,
}

/// Blocking operator interface; consulted only under
/// [`ConflictPolicy::PromptOperator`].
pub trait Operator {
    /// Shown before each block is transferred.
    fn confirm_block(&mut self, block: &Block, canonical: &str) -> Decision;
    /// Duplicate-date conflict: `true` overwrites, `false` aborts the run.
    fn confirm_overwrite(&mut self, store: &str, date: NaiveDate) -> bool;
    /// Unexpected error mid-run: `true` continues with the next block.
    fn error_continue(&mut self, store: &str, detail: &str) -> bool;
}

/// Operator that always proceeds; the natural companion of
/// [`ConflictPolicy::AutoOverwrite`].
#[derive(Debug, Default)]
pub struct Unattended;

impl Operator for Unattended {
    fn confirm_block(&mut self, _block: &Block, _canonical: &str) -> Decision {
        Decision::Proceed
    }
    fn confirm_overwrite(&mut self, _store: &str, _date: NaiveDate) -> bool {
        true
    }
    fn error_continue(&mut self, _store: &str, _detail: &str) -> bool {
        true
    }
}

/// Why a run stopped before the last block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunAbort {
    /// Operator declined an overwrite or cancelled at a prompt.
    OperatorDeclined { store: String, date: NaiveDate },
    /// Operator chose to stop after an error.
    OperatorStopped,
    /// Every checked item equals the previous day's figures: a likely
    /// duplicate resubmission, treated as fatal.
    PreviousDayIdentical {
        store: String,
        date: NaiveDate,
        /// `(ledger label, value)` pairs that matched yesterday exactly.
        compared: Vec<(String, u64)>,
    },
}

/// Tally of one reconciliation run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub aborted: Option<RunAbort>,
}

enum BlockOutcome {
    Committed { written: usize },
    AbortRun(RunAbort),
}

/// Run the engine over ordered blocks. Per-block resolution failures skip
/// that block and continue; only the previous-day anomaly and operator
/// decisions stop the run.
pub fn reconcile(
    book: &LedgerBook,
    blocks: &[Block],
    cfg: &PipelineConfig,
    policy: ConflictPolicy,
    operator: &mut dyn Operator,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for block in blocks {
        let (Some(store), Some(date)) = (block.store.as_ref(), block.date) else {
            report.skipped += 1;
            continue;
        };
        if block.items.is_empty() {
            report.skipped += 1;
            continue;
        }

        if policy == ConflictPolicy::PromptOperator {
            match operator.confirm_block(block, store.as_str()) {
                Decision::Proceed => {}
                Decision::Skip => {
                    report.skipped += 1;
                    continue;
                }
                Decision::Abort => {
                    report.aborted = Some(RunAbort::OperatorDeclined {
                        store: store.as_str().to_string(),
                        date,
                    });
                    break;
                }
            }
        }

        match process_block(book, block, store.as_str(), date, cfg, policy, operator) {
            Ok(BlockOutcome::Committed { written }) => {
                info!("{store} {date}: {written} cell(s) written");
                report.processed += 1;
            }
            Ok(BlockOutcome::AbortRun(abort)) => {
                report.aborted = Some(abort);
                break;
            }
            Err(err) => {
                warn!("{store} {date}: {err}");
                report.errors += 1;
                let unexpected =
                    matches!(err, LedgerError::Io(_) | LedgerError::Csv(_));
                if unexpected
                    && policy == ConflictPolicy::PromptOperator
                    && !operator.error_continue(store.as_str(), &err.to_string())
                {
                    report.aborted = Some(RunAbort::OperatorStopped);
                    break;
                }
            }
        }
    }
    report
}

fn process_block(
    book: &LedgerBook,
    block: &Block,
    store: &str,
    date: NaiveDate,
    cfg: &PipelineConfig,
    policy: ConflictPolicy,
    operator: &mut dyn Operator,
) -> Result<BlockOutcome, LedgerError> {
    let mut grid = book.open(date)?;
    let rows = grid.store_rows(store)?;
    let col = grid.date_column(date)?;

    // Duplicate-date check on the primary items.
    let occupied = PRIMARY_ITEMS.iter().any(|kind| {
        rows.get(cfg.ledger_label(kind.label()))
            .is_some_and(|&row| grid.cell_occupied(row, col))
    });
    if occupied {
        match policy {
            ConflictPolicy::AutoOverwrite => {
                info!("{store} {date}: existing data, auto-overwriting");
            }
            ConflictPolicy::PromptOperator => {
                if !operator.confirm_overwrite(store, date) {
                    return Ok(BlockOutcome::AbortRun(RunAbort::OperatorDeclined {
                        store: store.to_string(),
                        date,
                    }));
                }
            }
        }
    }

    // Previous-day-identical check: every submitted primary item matching a
    // non-zero figure in the preceding column means a probable resubmission.
    if let Some(prev_col) = grid.previous_column(col) {
        let mut compared = Vec::new();
        let mut all_matching = true;
        for kind in &PRIMARY_ITEMS {
            let label = cfg.ledger_label(kind.label());
            let (Some(&row), Some(&today)) =
                (rows.get(label), block.items.get(kind))
            else {
                continue;
            };
            match grid.cell_number(row, prev_col) {
                Some(yesterday) if yesterday != 0 => {
                    if i64::try_from(today).is_ok_and(|t| t == yesterday) {
                        compared.push((label.to_string(), today));
                    } else {
                        all_matching = false;
                        break;
                    }
                }
                _ => {
                    all_matching = false;
                    break;
                }
            }
        }
        if all_matching && !compared.is_empty() {
            return Ok(BlockOutcome::AbortRun(RunAbort::PreviousDayIdentical {
                store: store.to_string(),
                date,
                compared,
            }));
        }
    }

    // Commit, mapping each item label into the ledger vocabulary.
    let mut written = 0usize;
    for (kind, amount) in &block.items {
        let label = cfg.ledger_label(kind.label());
        match rows.get(label) {
            Some(&row) => {
                grid.set_cell(row, col, *amount);
                written += 1;
            }
            None => warn!("{store} {date}: no row for item '{label}', skipped"),
        }
    }
    book.save(&grid)?;
    Ok(BlockOutcome::Committed { written })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::month_grid;
    use uriage_core::StoreResolver;

    fn temp_book(tag: &str) -> LedgerBook {
        let dir = std::env::temp_dir().join(format!("uriage-reconcile-{tag}"));
        std::fs::remove_dir_all(&dir).ok();
        LedgerBook::new(dir)
    }

    fn seeded_book(tag: &str) -> LedgerBook {
        let book = temp_book(tag);
        let grid = month_grid(
            2025,
            7,
            31,
            &[
                ("マルタツ野木", "当日売上"),
                ("マルタツ野木", "当日仕入費"),
                ("マルタツ野木", "P/A"),
                ("マルキン高崎", "当日売上"),
            ],
        );
        book.save(&grid).unwrap();
        book
    }

    fn block(store: &str, date: (i32, u32, u32), items: &[(ItemKind, u64)]) -> Block {
        let cfg = PipelineConfig::default();
        let resolver = StoreResolver::new(&cfg);
        let mut b = Block::new();
        b.raw_store = format!("【店舗】{store}");
        let id = resolver.resolve(store).unwrap();
        b.rank = resolver.rank(&id);
        b.store = Some(id);
        b.date = NaiveDate::from_ymd_opt(date.0, date.1, date.2);
        for (kind, amount) in items {
            b.items.insert(kind.clone(), *amount);
        }
        b
    }

    /// Scripted operator recording what it was asked.
    #[derive(Default)]
    struct Script {
        overwrite_answer: bool,
        block_answer: Option<Decision>,
        overwrite_asked: usize,
        blocks_asked: usize,
    }

    impl Operator for Script {
        fn confirm_block(&mut self, _block: &Block, _canonical: &str) -> Decision {
            self.blocks_asked += 1;
            self.block_answer.unwrap_or(Decision::Proceed)
        }
        fn confirm_overwrite(&mut self, _store: &str, _date: NaiveDate) -> bool {
            self.overwrite_asked += 1;
            self.overwrite_answer
        }
        fn error_continue(&mut self, _store: &str, _detail: &str) -> bool {
            true
        }
    }

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_commit_writes_mapped_rows() {
        let book = seeded_book("commit");
        let blocks = vec![block(
            "マルタツ野木",
            (2025, 7, 29),
            &[
                (ItemKind::Revenue, 123_456),
                (ItemKind::LaborPartTime, 6_840),
            ],
        )];
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.processed, 1);
        assert_eq!(report.errors, 0);
        assert!(report.aborted.is_none());

        let grid = book.open(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        let rows = grid.store_rows("マルタツ野木").unwrap();
        let col = grid.date_column(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        assert_eq!(grid.cell_number(rows["当日売上"], col), Some(123_456));
        assert_eq!(grid.cell_number(rows["P/A"], col), Some(6_840));
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_item_without_row_is_skipped_not_fatal() {
        let book = seeded_book("norow");
        let blocks = vec![block(
            "マルタツ野木",
            (2025, 7, 10),
            &[
                (ItemKind::Revenue, 1_000),
                // 社員 has no row in this grid.
                (ItemKind::LaborFullTime, 2_000),
            ],
        )];
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.processed, 1);

        let grid = book.open(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()).unwrap();
        let rows = grid.store_rows("マルタツ野木").unwrap();
        let col = grid.date_column(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()).unwrap();
        assert_eq!(grid.cell_number(rows["当日売上"], col), Some(1_000));
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_batch_auto_overwrites_existing_data() {
        let book = seeded_book("overwrite");
        let first = vec![block("マルタツ野木", (2025, 7, 29), &[(ItemKind::Revenue, 50_000)])];
        reconcile(&book, &first, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);

        let second = vec![block("マルタツ野木", (2025, 7, 29), &[(ItemKind::Revenue, 60_000)])];
        let report = reconcile(&book, &second, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.processed, 1);

        let grid = book.open(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        let rows = grid.store_rows("マルタツ野木").unwrap();
        let col = grid.date_column(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        assert_eq!(grid.cell_number(rows["当日売上"], col), Some(60_000));
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_interactive_decline_aborts_run() {
        let book = seeded_book("decline");
        let seed = vec![block("マルタツ野木", (2025, 7, 29), &[(ItemKind::Revenue, 50_000)])];
        reconcile(&book, &seed, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);

        // Resubmission plus a second, clean block that must never run.
        let blocks = vec![
            block("マルタツ野木", (2025, 7, 29), &[(ItemKind::Revenue, 70_000)]),
            block("マルキン高崎", (2025, 7, 30), &[(ItemKind::Revenue, 80_000)]),
        ];
        let mut op = Script { overwrite_answer: false, ..Default::default() };
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::PromptOperator, &mut op);
        assert_eq!(op.overwrite_asked, 1);
        assert_eq!(report.processed, 0);
        assert!(matches!(report.aborted, Some(RunAbort::OperatorDeclined { .. })));

        let grid = book.open(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        let rows = grid.store_rows("マルタツ野木").unwrap();
        let col29 = grid.date_column(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        let col30 = grid.date_column(NaiveDate::from_ymd_opt(2025, 7, 30).unwrap()).unwrap();
        assert_eq!(grid.cell_number(rows["当日売上"], col29), Some(50_000), "decline left the old value");
        let takasaki = grid.store_rows("マルキン高崎").unwrap();
        assert_eq!(grid.cell_number(takasaki["当日売上"], col30), None, "later block never ran");
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_interactive_skip_moves_to_next_block() {
        let book = seeded_book("skip");
        let blocks = vec![
            block("マルタツ野木", (2025, 7, 5), &[(ItemKind::Revenue, 1_000)]),
            block("マルキン高崎", (2025, 7, 5), &[(ItemKind::Revenue, 2_000)]),
        ];
        let mut op = Script { block_answer: Some(Decision::Skip), ..Default::default() };
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::PromptOperator, &mut op);
        assert_eq!(op.blocks_asked, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.processed, 0);
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_previous_day_identical_aborts_without_writing() {
        let book = seeded_book("prevday");
        let monday = vec![block(
            "マルタツ野木",
            (2025, 7, 28),
            &[(ItemKind::Revenue, 50_000), (ItemKind::Purchase, 30_000)],
        )];
        reconcile(&book, &monday, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);

        // Tuesday reports the exact same primary figures.
        let tuesday = vec![block(
            "マルタツ野木",
            (2025, 7, 29),
            &[(ItemKind::Revenue, 50_000), (ItemKind::Purchase, 30_000)],
        )];
        let report = reconcile(&book, &tuesday, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.processed, 0);
        match &report.aborted {
            Some(RunAbort::PreviousDayIdentical { store, date, compared }) => {
                assert_eq!(store, "マルタツ野木");
                assert_eq!(*date, NaiveDate::from_ymd_opt(2025, 7, 29).unwrap());
                assert_eq!(compared.len(), 2);
            }
            other => panic!("expected PreviousDayIdentical, got {other:?}"),
        }

        let grid = book.open(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        let rows = grid.store_rows("マルタツ野木").unwrap();
        let col = grid.date_column(NaiveDate::from_ymd_opt(2025, 7, 29).unwrap()).unwrap();
        assert_eq!(grid.cell_number(rows["当日売上"], col), None, "no write on anomaly");
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_previous_day_partial_match_is_fine() {
        let book = seeded_book("prevpartial");
        let monday = vec![block(
            "マルタツ野木",
            (2025, 7, 28),
            &[(ItemKind::Revenue, 50_000), (ItemKind::Purchase, 30_000)],
        )];
        reconcile(&book, &monday, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);

        let tuesday = vec![block(
            "マルタツ野木",
            (2025, 7, 29),
            &[(ItemKind::Revenue, 50_000), (ItemKind::Purchase, 31_000)],
        )];
        let report = reconcile(&book, &tuesday, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.processed, 1);
        assert!(report.aborted.is_none());
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_first_column_has_no_previous_day() {
        let book = seeded_book("firstcol");
        let blocks = vec![block("マルタツ野木", (2025, 7, 1), &[(ItemKind::Revenue, 1_000)])];
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.processed, 1);
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_missing_period_skips_block_and_continues() {
        let book = seeded_book("period");
        let blocks = vec![
            // August has no ledger file.
            block("マルタツ野木", (2025, 8, 1), &[(ItemKind::Revenue, 1_000)]),
            block("マルタツ野木", (2025, 7, 20), &[(ItemKind::Revenue, 2_000)]),
        ];
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.errors, 1);
        assert_eq!(report.processed, 1);
        assert!(report.aborted.is_none());
        std::fs::remove_dir_all(book.dir()).ok();
    }

    #[test]
    fn test_store_without_rows_counts_as_error() {
        let book = seeded_book("nostore");
        let blocks = vec![block("寅ジロー小山", (2025, 7, 3), &[(ItemKind::Revenue, 1_000)])];
        let report = reconcile(&book, &blocks, &cfg(), ConflictPolicy::AutoOverwrite, &mut Unattended);
        assert_eq!(report.errors, 1);
        assert_eq!(report.processed, 0);
        std::fs::remove_dir_all(book.dir()).ok();
    }
}
