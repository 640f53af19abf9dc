use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use uriage_core::PipelineConfig;

/// Optional TOML overrides; anything absent keeps the built-in table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub roster: Option<Vec<String>>,
    pub store_aliases: Option<Vec<(String, String)>>,
    pub item_labels: Option<Vec<(String, String)>>,
    pub exclude_keywords: Option<Vec<String>>,
    pub include_keywords: Option<Vec<String>>,
    pub intra_order: Option<Vec<String>>,
    pub unique_substring_fallback: Option<bool>,
}

/// Load the pipeline config, merging a TOML override file over the
/// defaults when one is given.
pub fn load_pipeline_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let mut cfg = PipelineConfig::default();
    if let Some(path) = path {
        let s = fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&s)
            .with_context(|| format!("parse {}", path.display()))?;
        merge(&mut cfg, file);
    }
    cfg.validate().context("invalid pipeline config")?;
    Ok(cfg)
}

fn merge(cfg: &mut PipelineConfig, file: ConfigFile) {
    if let Some(v) = file.roster {
        cfg.roster = v;
    }
    if let Some(v) = file.store_aliases {
        cfg.store_aliases = v;
    }
    if let Some(v) = file.item_labels {
        cfg.item_labels = v;
    }
    if let Some(v) = file.exclude_keywords {
        cfg.exclude_keywords = v;
    }
    if let Some(v) = file.include_keywords {
        cfg.include_keywords = v;
    }
    if let Some(v) = file.intra_order {
        cfg.intra_order = v;
    }
    if let Some(v) = file.unique_substring_fallback {
        cfg.unique_substring_fallback = v;
    }
}
