//! Line classification: decide what role a raw report line plays before any
//! field-level processing happens.
//!
//! The precedence is fixed and auditable: blank, then anchor, then
//! exclusion, then inclusion. Exclusion always wins over inclusion; anchors
//! win over everything because they delimit report segments even when the
//! rest of the line looks like noise.

use regex::Regex;

use crate::config::PipelineConfig;
use crate::error::CoreError;

/// Classification of one trimmed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Starts a new report block (timestamp prefix or date/datetime label).
    Anchor,
    /// Matches the noise keyword set; dropped.
    Excluded,
    /// Candidate data line.
    Includable,
    /// Empty after trimming.
    Blank,
    /// Matches neither set; dropped silently.
    Unparseable,
}

/// Table-driven classifier compiled once from a [`PipelineConfig`].
#[derive(Debug)]
pub struct LineClassifier {
    timestamp_re: Regex,
    anchor_keywords: Vec<String>,
    exclude_keywords: Vec<String>,
    include_keywords: Vec<String>,
}

impl LineClassifier {
    pub fn new(cfg: &PipelineConfig) -> Result<Self, CoreError> {
        Ok(Self {
            timestamp_re: Regex::new(r"^\d{2}:\d{2}\s+")?,
            anchor_keywords: vec!["日付".to_string(), "日時".to_string()],
            exclude_keywords: cfg.exclude_keywords.clone(),
            include_keywords: cfg.include_keywords.clone(),
        })
    }

    /// Classify one line. Exactly one class applies to any input.
    pub fn classify(&self, line: &str) -> LineClass {
        let line = line.trim();
        if line.is_empty() {
            return LineClass::Blank;
        }
        if self.timestamp_re.is_match(line)
            || self.anchor_keywords.iter().any(|k| line.contains(k.as_str()))
        {
            return LineClass::Anchor;
        }
        if self.exclude_keywords.iter().any(|k| line.contains(k.as_str())) {
            return LineClass::Excluded;
        }
        if self.include_keywords.iter().any(|k| line.contains(k.as_str())) {
            return LineClass::Includable;
        }
        LineClass::Unparseable
    }
}
