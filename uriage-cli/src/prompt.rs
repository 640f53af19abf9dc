use std::io::{self, Write};

use chrono::{Datelike, NaiveDate};

use uriage_core::Block;
use uriage_ledger::{Decision, Operator};

fn ask(label: &str) -> String {
    print!("{} ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s).ok();
    s.trim().to_lowercase()
}

/// Console operator: blocks the run on stdin, mirroring the dialogs of the
/// original interactive flow.
pub struct StdinOperator;

impl Operator for StdinOperator {
    fn confirm_block(&mut self, block: &Block, canonical: &str) -> Decision {
        println!("\n転記確認");
        println!("  店舗: {} (正規化後: {})", block.raw_store, canonical);
        if let Some(date) = block.date {
            println!("  日付: {}月{}日", date.month(), date.day());
        }
        for (kind, amount) in &block.items {
            println!("  ・{}: {}円", kind.label(), amount);
        }
        loop {
            match ask("この店舗のデータを転記しますか？ [y]es / [n]o (skip) / [c]ancel:").as_str() {
                "y" | "yes" => return Decision::Proceed,
                "n" | "no" => return Decision::Skip,
                "c" | "cancel" => return Decision::Abort,
                _ => {}
            }
        }
    }

    fn confirm_overwrite(&mut self, store: &str, date: NaiveDate) -> bool {
        println!("\n日付重複: {store} の {date} には既にデータがあります。");
        loop {
            match ask("上書きしますか？ [y]es / [n]o (abort run):").as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => {}
            }
        }
    }

    fn error_continue(&mut self, store: &str, detail: &str) -> bool {
        println!("\nエラー発生: {store}: {detail}");
        loop {
            match ask("処理を続行しますか？ [y]es / [n]o:").as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => {}
            }
        }
    }
}
