//! Static pipeline configuration: store roster, alias and label tables,
//! keyword sets.
//!
//! Everything the parser and reconciler need to know about the reporting
//! vocabulary lives here and is passed in at construction. The defaults
//! mirror the production tables; callers can override any of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The known-store roster in display order. Position defines [`StoreRank`].
///
/// [`StoreRank`]: crate::store::StoreRank
const DEFAULT_ROSTER: &[&str] = &[
    "マルキン三毳",
    "マルキン高崎",
    "マルキン土浦",
    "マルタツ羽川",
    "マルタツ結城",
    "マルタツ小山",
    "マルタツ藤岡",
    "マルタツ真岡",
    "マルタツ野木",
    "マルタツ高崎",
    "クロリ小山",
    "ハレパン小山野木真岡",
    "寅ジロー小山",
];

/// Raw fragment → canonical store id.
const DEFAULT_STORE_ALIASES: &[(&str, &str)] = &[
    ("野木", "マルタツ野木"),
    ("小山", "マルタツ小山"),
    ("結城", "マルタツ結城"),
    ("藤岡", "マルタツ藤岡"),
    ("真岡", "マルタツ真岡"),
    ("羽川", "マルタツ羽川"),
    ("高崎", "マルタツ高崎"),
    ("クロリ", "クロリ小山"),
    ("クロリ小山工場佐野", "クロリ小山"),
    ("晴れパン", "ハレパン小山野木真岡"),
    ("ハレパン", "ハレパン小山野木真岡"),
    ("寅ジロー", "寅ジロー小山"),
];

/// Report item label → ledger row label.
const DEFAULT_ITEM_LABELS: &[(&str, &str)] = &[
    ("売上", "当日売上"),
    ("仕入", "当日仕入費"),
    ("仕入費", "当日仕入費"),
    ("人件費", "当日人件費"),
    ("P/A", "P/A"),
    ("社員", "社員"),
];

/// Noise keywords. A line containing any of these is excluded outright.
const DEFAULT_EXCLUDE_KEYWORDS: &[&str] = &[
    "天気", "天候", "単価", "達成", "弁当", "食堂", "予算", "サービス", "運営",
    "小山売上", "野木売上", "真岡売上", "佐野売上", "本数", "最高", "気温",
    "月間", "ラスク", "揚", "問題", "客数", "組数", "コメント", "現金", "新規",
    "過不足",
];

/// Data markers. A non-excluded line containing any of these is kept.
const DEFAULT_INCLUDE_KEYWORDS: &[&str] = &[
    "【", "】", "日付", "日時", "店舗", "担当", "売上", "仕入", "人件", "費",
    "P/A", "社員",
];

/// Keyword priority for ordering lines inside one report block.
const DEFAULT_INTRA_ORDER: &[&str] = &[
    "日時", "日付", "店舗", "担当者", "売上", "人件費", "P/A", "社員", "仕入費",
    "仕入",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("store roster is empty")]
    EmptyRoster,
    #[error("alias '{0}' targets unknown store '{1}'")]
    UnknownAliasTarget(String, String),
    #[error("inclusion keyword set is empty")]
    EmptyIncludeKeywords,
}

/// All static tables consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Canonical store ids, ordered. Index is the store's display rank.
    pub roster: Vec<String>,
    /// Normalized raw fragment → canonical store id.
    pub store_aliases: Vec<(String, String)>,
    /// Report item label → ledger row label.
    pub item_labels: Vec<(String, String)>,
    pub exclude_keywords: Vec<String>,
    pub include_keywords: Vec<String>,
    /// Keyword priority list for intra-block line ordering.
    pub intra_order: Vec<String>,
    /// Accept a partial store match when exactly one candidate qualifies.
    pub unique_substring_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let own = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        let own_pairs = |xs: &[(&str, &str)]| {
            xs.iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect()
        };
        Self {
            roster: own(DEFAULT_ROSTER),
            store_aliases: own_pairs(DEFAULT_STORE_ALIASES),
            item_labels: own_pairs(DEFAULT_ITEM_LABELS),
            exclude_keywords: own(DEFAULT_EXCLUDE_KEYWORDS),
            include_keywords: own(DEFAULT_INCLUDE_KEYWORDS),
            intra_order: own(DEFAULT_INTRA_ORDER),
            unique_substring_fallback: true,
        }
    }
}

impl PipelineConfig {
    /// Check table consistency before the pipeline is built from this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        if self.include_keywords.is_empty() {
            return Err(ConfigError::EmptyIncludeKeywords);
        }
        for (raw, canonical) in &self.store_aliases {
            if !self.roster.iter().any(|r| r == canonical) {
                return Err(ConfigError::UnknownAliasTarget(
                    raw.clone(),
                    canonical.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Ledger row label for a report item label (identity when unmapped).
    pub fn ledger_label<'a>(&'a self, item_label: &'a str) -> &'a str {
        self.item_labels
            .iter()
            .find(|(from, _)| from == item_label)
            .map(|(_, to)| to.as_str())
            .unwrap_or(item_label)
    }
}
