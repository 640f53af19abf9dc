use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Asia::Tokyo;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use uriage_ingest::{parse_and_order, render_normalized, ParsedReport};
use uriage_ledger::{reconcile, ConflictPolicy, LedgerBook, RunAbort, Unattended};

mod config;
mod prompt;

#[derive(Parser, Debug)]
#[command(name = "uriage", version, about = "Chat sales-report ledger reconciler")]
struct Cli {
    /// Optional TOML file overriding the built-in roster/keyword tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a pasted report and print the ordered review text
    Format {
        /// Input text file ("-" for stdin)
        input: PathBuf,
    },

    /// Parse a report and print the resolved blocks as JSON
    Blocks {
        /// Input text file ("-" for stdin)
        input: PathBuf,
    },

    /// Reconcile a report into the ledger book
    Transfer {
        /// Input text file ("-" for stdin)
        input: PathBuf,

        /// Directory holding one CSV per period (e.g. 2507月_売上.csv)
        #[arg(long)]
        ledger_dir: PathBuf,

        /// Overwrite conflicts automatically instead of prompting
        #[arg(long)]
        batch: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = config::load_pipeline_config(cli.config.as_deref())?;
    let today = today_in_report_tz();

    match cli.command {
        Command::Format { input } => {
            let report = parse_input(&input, &cfg, today)?;
            print!("{}", render_normalized(&report.blocks));
            report_tallies(&report);
        }

        Command::Blocks { input } => {
            let report = parse_input(&input, &cfg, today)?;
            let blocks: Vec<serde_json::Value> = report
                .blocks
                .iter()
                .map(|b| {
                    let items: serde_json::Map<String, serde_json::Value> = b
                        .items
                        .iter()
                        .map(|(kind, amount)| {
                            (kind.label().to_string(), serde_json::json!(amount))
                        })
                        .collect();
                    serde_json::json!({
                        "store": b.store.as_ref().map(|s| s.as_str()),
                        "date": b.date.map(|d| d.to_string()),
                        "items": items,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        }

        Command::Transfer { input, ledger_dir, batch } => {
            let report = parse_input(&input, &cfg, today)?;
            if report.blocks.is_empty() {
                bail!("no valid report blocks found in {}", input.display());
            }
            report_tallies(&report);

            let book = LedgerBook::new(ledger_dir);
            let outcome = if batch {
                reconcile(&book, &report.blocks, &cfg, ConflictPolicy::AutoOverwrite, &mut Unattended)
            } else {
                reconcile(
                    &book,
                    &report.blocks,
                    &cfg,
                    ConflictPolicy::PromptOperator,
                    &mut prompt::StdinOperator,
                )
            };

            println!(
                "\n{}件転記、{}件スキップ、{}件エラー",
                outcome.processed, outcome.skipped, outcome.errors
            );
            if let Some(abort) = outcome.aborted {
                match abort {
                    RunAbort::PreviousDayIdentical { store, date, compared } => {
                        let detail: Vec<String> = compared
                            .iter()
                            .map(|(label, value)| format!("{label}={value}円"))
                            .collect();
                        bail!(
                            "{store} {date}: 前日と同一の報告 ({}) のため処理を中断しました",
                            detail.join(", ")
                        );
                    }
                    RunAbort::OperatorDeclined { store, date } => {
                        bail!("{store} {date}: 操作者の判断で処理を中断しました");
                    }
                    RunAbort::OperatorStopped => {
                        bail!("エラー後の継続が拒否されたため処理を中断しました");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Report-local "today", used to complete dates written without a year.
fn today_in_report_tz() -> NaiveDate {
    Utc::now().with_timezone(&Tokyo).date_naive()
}

fn parse_input(
    input: &PathBuf,
    cfg: &uriage_core::PipelineConfig,
    today: NaiveDate,
) -> Result<ParsedReport> {
    let text = if input.as_os_str() == "-" {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .context("read stdin")?;
        s
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("read {}", input.display()))?
    };
    parse_and_order(&text, cfg, today.year())
        .with_context(|| format!("parsing {}", input.display()))
}

fn report_tallies(report: &ParsedReport) {
    if report.dropped_blocks > 0 || report.unresolved_stores > 0 || report.unparsed_lines > 0 {
        eprintln!(
            "({}ブロック破棄、{}店舗未解決、{}行解析不能)",
            report.dropped_blocks, report.unresolved_stores, report.unparsed_lines
        );
    }
}
