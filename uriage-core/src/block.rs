//! Report block types: one block is one store's report for one date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::store::StoreId;

/// Classified category of a monetary figure in a report line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    Revenue,
    LaborPartTime,
    LaborFullTime,
    LaborTotal,
    Purchase,
    /// Anything outside the fixed vocabulary, keyed by its raw label.
    Other(String),
}

impl ItemKind {
    /// Report-vocabulary label, as it appears in the item mapping table.
    pub fn label(&self) -> &str {
        match self {
            ItemKind::Revenue => "売上",
            ItemKind::LaborPartTime => "P/A",
            ItemKind::LaborFullTime => "社員",
            ItemKind::LaborTotal => "人件費",
            ItemKind::Purchase => "仕入",
            ItemKind::Other(label) => label,
        }
    }
}

/// One parsed report segment.
///
/// Built up by the segment assembler; `store` and `rank` are filled in by
/// the store resolver. A block is only eligible for reconciliation once
/// both `store` and `date` are resolved and `items` is non-empty.
#[derive(Debug, Clone)]
pub struct Block {
    /// The store line as written by the reporter (formatted, not resolved).
    pub raw_store: String,
    pub store: Option<StoreId>,
    /// Display rank of the resolved store; `None` sorts last.
    pub rank: Option<usize>,
    pub date: Option<NaiveDate>,
    /// Extracted amounts, one per kind; later lines overwrite earlier ones.
    pub items: BTreeMap<ItemKind, u64>,
    /// Formatted lines in intra-block order, for the review artifact.
    pub lines: Vec<String>,
}

impl Block {
    pub fn new() -> Self {
        Self {
            raw_store: String::new(),
            store: None,
            rank: None,
            date: None,
            items: BTreeMap::new(),
            lines: Vec::new(),
        }
    }

    /// Whether the assembler should keep this block at flush time.
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && !self.raw_store.is_empty() && !self.items.is_empty()
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}
