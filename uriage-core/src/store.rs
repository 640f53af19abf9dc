//! Store resolution: map noisy raw store text to a canonical roster id.
//!
//! Resolution is a pure function of the input string and the static tables,
//! so the same text always yields the same id or the same failure.

use std::fmt;

use log::debug;

use crate::config::PipelineConfig;
use crate::error::StoreNotFound;

/// Canonical store identifier, registered in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId(String);

impl StoreId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolver over the roster and alias tables of one [`PipelineConfig`].
#[derive(Debug)]
pub struct StoreResolver {
    roster: Vec<String>,
    aliases: Vec<(String, String)>,
    unique_substring_fallback: bool,
}

impl StoreResolver {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            roster: cfg.roster.clone(),
            aliases: cfg.store_aliases.clone(),
            unique_substring_fallback: cfg.unique_substring_fallback,
        }
    }

    /// Strip the store-label marker, all whitespace and a trailing 店.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text: String = raw
            .replace("【店舗名】", "")
            .replace("【店舗】", "")
            .split_whitespace()
            .collect();
        // A bare label with optional separator: 店舗：マルタツ野木
        for marker in ["店舗：", "店舗:", "店舗"] {
            if let Some(rest) = text.strip_prefix(marker) {
                text = rest.to_string();
                break;
            }
        }
        text.strip_suffix('店').map(str::to_string).unwrap_or(text)
    }

    /// Resolve raw store text to a canonical id.
    pub fn resolve(&self, raw: &str) -> Result<StoreId, StoreNotFound> {
        let normalized = self.normalize(raw);

        if self.roster.iter().any(|r| *r == normalized) {
            return Ok(StoreId(normalized));
        }

        if let Some((_, canonical)) =
            self.aliases.iter().find(|(from, _)| *from == normalized)
        {
            debug!("store alias: {normalized} -> {canonical}");
            return Ok(StoreId(canonical.clone()));
        }

        for candidate in &self.roster {
            if self.contains_match(&normalized, candidate) {
                debug!("store containment: {normalized} -> {candidate}");
                return Ok(StoreId(candidate.clone()));
            }
        }

        if self.unique_substring_fallback {
            let candidates: Vec<&String> = self
                .roster
                .iter()
                .filter(|r| !normalized.is_empty() && r.contains(normalized.as_str()))
                .collect();
            if let [only] = candidates.as_slice() {
                debug!("store unique-substring fallback: {normalized} -> {only}");
                return Ok(StoreId((*only).clone()));
            }
            return Err(StoreNotFound {
                raw: raw.to_string(),
                normalized,
                candidates: candidates.into_iter().cloned().collect(),
            });
        }

        Err(StoreNotFound {
            raw: raw.to_string(),
            normalized,
            candidates: Vec::new(),
        })
    }

    /// Display rank of a canonical id: its roster position.
    pub fn rank(&self, id: &StoreId) -> Option<usize> {
        self.roster.iter().position(|r| r == id.as_str())
    }

    /// Containment test with the two roster-specific disambiguation rules:
    /// lone 野木 counts as マルタツ野木 unless the broader マルタツ brand is
    /// also present, and either ハレパン spelling counts as the ハレパン id.
    fn contains_match(&self, text: &str, candidate: &str) -> bool {
        match candidate {
            "マルタツ野木" => {
                text.contains(candidate)
                    || (text.contains("野木") && !text.contains("マルタツ"))
            }
            "ハレパン小山野木真岡" => {
                text.contains("晴れパン") || text.contains("ハレパン")
            }
            _ => text.contains(candidate),
        }
    }
}
