//! Segment assembly: classify, format and group raw chat lines into blocks,
//! then resolve stores and order everything deterministically.

use log::{debug, warn};
use thiserror::Error;

use uriage_core::{
    order_blocks, Block, CoreError, FieldFormatter, IntraBlockOrderer, LineClass,
    LineClassifier, PipelineConfig, StoreResolver,
};

use crate::extract::extract_item;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no input data")]
    NoInputData,
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Output of one parse run, with the drop tallies the caller reports.
#[derive(Debug)]
pub struct ParsedReport {
    pub blocks: Vec<Block>,
    /// Blocks discarded for missing store, missing date or zero items.
    pub dropped_blocks: usize,
    /// Lines that matched neither keyword set.
    pub unparsed_lines: usize,
    /// Blocks whose store text failed to resolve (kept out of `blocks`).
    pub unresolved_stores: usize,
}

/// Parse a raw report blob into assembled blocks.
///
/// Blocks are delimited by anchor lines; lines ahead of the first anchor are
/// dropped. `current_year` fills in dates written without a year.
pub fn parse_report(
    text: &str,
    cfg: &PipelineConfig,
    current_year: i32,
) -> Result<ParsedReport, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::NoInputData);
    }

    let classifier = LineClassifier::new(cfg)?;
    let formatter = FieldFormatter::new()?;

    let mut blocks: Vec<Block> = Vec::new();
    let mut open: Option<Block> = None;
    let mut dropped_blocks = 0usize;
    let mut unparsed_lines = 0usize;

    let mut flush = |open: &mut Option<Block>, dropped: &mut usize| {
        if let Some(block) = open.take() {
            if block.is_complete() {
                blocks.push(block);
            } else {
                debug!(
                    "dropping incomplete block (store {:?}, date {:?}, {} items)",
                    block.raw_store,
                    block.date,
                    block.items.len()
                );
                *dropped += 1;
            }
        }
    };

    for raw_line in text.lines() {
        let line = raw_line.trim();
        match classifier.classify(line) {
            LineClass::Blank | LineClass::Excluded => {}
            LineClass::Unparseable => unparsed_lines += 1,
            LineClass::Anchor => {
                flush(&mut open, &mut dropped_blocks);
                let mut block = Block::new();
                // Date comes from the raw text so an explicit year survives
                // the display rewrite.
                block.date = uriage_core::parse_report_date(line, current_year);
                block.lines.push(formatter.format(line));
                open = Some(block);
            }
            LineClass::Includable => {
                let Some(block) = open.as_mut() else {
                    debug!("data line before first anchor: {line}");
                    continue;
                };
                let formatted = formatter.format(line);
                let squashed: String = formatted.split_whitespace().collect();
                if squashed.contains("店舗") && block.raw_store.is_empty() {
                    block.raw_store = formatted.clone();
                } else if let Some((kind, amount)) = extract_item(&formatted) {
                    // Later duplicates overwrite earlier ones.
                    block.items.insert(kind, amount);
                }
                block.lines.push(formatted);
            }
        }
    }
    flush(&mut open, &mut dropped_blocks);

    Ok(ParsedReport {
        blocks,
        dropped_blocks,
        unparsed_lines,
        unresolved_stores: 0,
    })
}

/// Full front half of the pipeline: parse, intra-order each block's lines,
/// resolve stores, cross-order blocks. Blocks whose store fails to resolve
/// are dropped and tallied.
pub fn parse_and_order(
    text: &str,
    cfg: &PipelineConfig,
    current_year: i32,
) -> Result<ParsedReport, IngestError> {
    let mut report = parse_report(text, cfg, current_year)?;

    let orderer = IntraBlockOrderer::new(&cfg.intra_order)?;
    let resolver = StoreResolver::new(cfg);

    let mut resolved = Vec::with_capacity(report.blocks.len());
    for mut block in report.blocks.drain(..) {
        block.lines = orderer.order(&block.lines);
        match resolver.resolve(&block.raw_store) {
            Ok(id) => {
                block.rank = resolver.rank(&id);
                block.store = Some(id);
                resolved.push(block);
            }
            Err(err) => {
                warn!("{err}");
                report.unresolved_stores += 1;
            }
        }
    }
    order_blocks(&mut resolved);
    report.blocks = resolved;
    Ok(report)
}

/// Render the blank-line-separated review artifact for ordered blocks.
pub fn render_normalized(blocks: &[Block]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in &block.lines {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uriage_core::ItemKind;

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_single_report_end_to_end() {
        let text = "08:27 a_ki 7月29日(火)\n\
                    【店舗】マルタツ野木\n\
                    【売上】123,456円\n\
                    【人件費】P/A 6,840円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert_eq!(report.blocks.len(), 1);
        let block = &report.blocks[0];
        assert_eq!(block.date, NaiveDate::from_ymd_opt(2025, 7, 29));
        assert_eq!(block.store.as_ref().unwrap().as_str(), "マルタツ野木");
        assert_eq!(block.items.get(&ItemKind::Revenue), Some(&123_456));
        assert_eq!(block.items.get(&ItemKind::LaborPartTime), Some(&6_840));
        assert_eq!(block.items.len(), 2);
    }

    #[test]
    fn test_noise_lines_filtered() {
        let text = "08:27 a_ki 7月29日(火)\n\
                    【店舗】マルタツ野木\n\
                    天気：晴れのち曇り\n\
                    客数 152名\n\
                    【売上】123,456円\n\
                    ありがとうございました";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert_eq!(report.blocks.len(), 1);
        let block = &report.blocks[0];
        assert_eq!(block.items.len(), 1);
        assert_eq!(report.unparsed_lines, 1);
        assert!(block.lines.iter().all(|l| !l.contains("天気")));
    }

    #[test]
    fn test_block_without_store_dropped() {
        let text = "08:27 a_ki 7月29日(火)\n【売上】123,456円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert!(report.blocks.is_empty());
        assert_eq!(report.dropped_blocks, 1);
    }

    #[test]
    fn test_block_without_items_dropped() {
        let text = "08:27 a_ki 7月29日(火)\n【店舗】マルタツ野木\n担当 佐藤";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert!(report.blocks.is_empty());
        assert_eq!(report.dropped_blocks, 1);
    }

    #[test]
    fn test_dateless_block_dropped() {
        let text = "【日時】未定\n【店舗】マルタツ野木\n【売上】1,000円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert!(report.blocks.is_empty());
        assert_eq!(report.dropped_blocks, 1);
    }

    #[test]
    fn test_duplicate_item_last_write_wins() {
        let text = "08:27 a_ki 7月29日(火)\n\
                    【店舗】マルタツ野木\n\
                    【売上】100円\n\
                    【売上】200円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert_eq!(report.blocks[0].items.get(&ItemKind::Revenue), Some(&200));
    }

    #[test]
    fn test_multiple_blocks_ordered_by_date_and_rank() {
        let text = "09:00 x 7月2日\n【店舗】マルタツ野木\n【売上】1円\n\
                    09:05 y 7月1日\n【店舗】マルキン高崎\n【売上】2円\n\
                    09:10 z 7月1日\n【店舗】マルキン三毳\n【売上】3円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        let stores: Vec<&str> = report
            .blocks
            .iter()
            .map(|b| b.store.as_ref().unwrap().as_str())
            .collect();
        // July 1 first, 三毳 (rank 0) before 高崎 (rank 1), July 2 last.
        assert_eq!(stores, vec!["マルキン三毳", "マルキン高崎", "マルタツ野木"]);
    }

    #[test]
    fn test_unresolvable_store_tallied() {
        let text = "09:00 x 7月1日\n【店舗】謎の店XYZ\n【売上】1円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        assert!(report.blocks.is_empty());
        assert_eq!(report.unresolved_stores, 1);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            parse_report("", &cfg(), 2025),
            Err(IngestError::NoInputData)
        ));
        assert!(matches!(
            parse_report("  \n \n", &cfg(), 2025),
            Err(IngestError::NoInputData)
        ));
    }

    #[test]
    fn test_render_normalized_blank_line_separated() {
        let text = "09:00 x 7月1日\n【店舗】マルキン三毳\n【売上】5000円\n\
                    09:05 y 7月2日\n【店舗】マルキン高崎\n【売上】6000円";
        let report = parse_and_order(text, &cfg(), 2025).unwrap();
        let rendered = render_normalized(&report.blocks);
        let chunks: Vec<&str> = rendered.trim_end().split("\n\n").collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("【売上】5,000円"));
        assert!(chunks[1].contains("【売上】6,000円"));
    }
}
