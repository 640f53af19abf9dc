//! Deterministic ordering: lines within a block, blocks across a run.

use chrono::NaiveDate;
use regex::Regex;

use crate::block::Block;
use crate::error::CoreError;

/// Orders the lines of one block by keyword priority.
#[derive(Debug)]
pub struct IntraBlockOrderer {
    keywords: Vec<String>,
    role_amount_re: Regex,
}

impl IntraBlockOrderer {
    pub fn new(keywords: &[String]) -> Result<Self, CoreError> {
        Ok(Self {
            keywords: keywords.to_vec(),
            role_amount_re: Regex::new(r"(P/A|社員)\s*[0-9,]+\s*円")?,
        })
    }

    /// Reorder `lines` by the keyword priority list.
    ///
    /// Matching is whitespace-insensitive substring; every line matching a
    /// keyword is placed in encounter order. A labor-cost line drags an
    /// immediately following role-amount line along with it so a split
    /// breakdown stays next to its parent. Leftover role-amount lines come
    /// next, all other leftovers last, both in original order.
    pub fn order(&self, lines: &[String]) -> Vec<String> {
        let n = lines.len();
        let mut placed = vec![false; n];
        let mut out = Vec::with_capacity(n);

        for keyword in &self.keywords {
            for i in 0..n {
                if placed[i] {
                    continue;
                }
                let squashed: String = lines[i].split_whitespace().collect();
                if !squashed.contains(keyword.as_str()) {
                    continue;
                }
                out.push(lines[i].clone());
                placed[i] = true;
                if keyword == "人件費"
                    && i + 1 < n
                    && !placed[i + 1]
                    && self.role_amount_re.is_match(&lines[i + 1])
                {
                    out.push(lines[i + 1].clone());
                    placed[i + 1] = true;
                }
            }
        }

        for i in 0..n {
            if !placed[i] && self.role_amount_re.is_match(&lines[i]) {
                out.push(lines[i].clone());
                placed[i] = true;
            }
        }
        for i in 0..n {
            if !placed[i] && !lines[i].trim().is_empty() {
                out.push(lines[i].clone());
            }
        }
        out
    }
}

/// Stable sort: date ascending (unresolved last), then store rank ascending
/// (unranked last). Blocks sharing date and rank keep their input order.
pub fn order_blocks(blocks: &mut [Block]) {
    blocks.sort_by_key(|b| {
        (
            b.date.unwrap_or(NaiveDate::MAX),
            b.rank.unwrap_or(usize::MAX),
        )
    });
}
