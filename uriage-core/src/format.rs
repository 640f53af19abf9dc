//! Field formatting for kept report lines.
//!
//! Normalizes the half-dozen ways operators type the same thing: comma
//! placement in amounts, date notation, spacing around role labels and the
//! currency unit. The whole transform is idempotent, so already-formatted
//! text passes through unchanged.

use regex::Regex;

use crate::error::CoreError;

#[derive(Debug)]
pub struct FieldFormatter {
    slash_date_re: Regex,
    kanji_date_re: Regex,
    role_digit_re: Regex,
    yen_space_re: Regex,
    ws_re: Regex,
}

impl FieldFormatter {
    pub fn new() -> Result<Self, CoreError> {
        Ok(Self {
            slash_date_re: Regex::new(r"(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})")?,
            kanji_date_re: Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日")?,
            role_digit_re: Regex::new(r"(P/A|社員)(\d)")?,
            yen_space_re: Regex::new(r"([0-9,]+)\s+円")?,
            ws_re: Regex::new(r"\s+")?,
        })
    }

    /// Normalize one line.
    pub fn format(&self, line: &str) -> String {
        let mut text = strip_digit_commas(line);
        text = self.rewrite_dates(&text);
        text = self.role_digit_re.replace_all(&text, "$1 $2").into_owned();
        text = regroup_amounts(&text);
        text = self.yen_space_re.replace_all(&text, "$1円").into_owned();
        text = self.ws_re.replace_all(&text, " ").into_owned();
        text.trim().to_string()
    }

    /// Rewrite year-bearing dates to the `M月D日` display form. The year is
    /// dropped here; block dates keep it via [`crate::date::parse_report_date`]
    /// which runs on the raw line.
    fn rewrite_dates(&self, text: &str) -> String {
        let md = |caps: &regex::Captures| -> String {
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);
            format!("{}月{}日", month, day)
        };
        let text = self.slash_date_re.replace_all(text, &md);
        self.kanji_date_re.replace_all(&text, &md).into_owned()
    }
}

/// Remove every comma sandwiched between digits, looping so that runs like
/// `1,2,3` fully collapse.
fn strip_digit_commas(text: &str) -> String {
    let re = Regex::new(r"(\d),(\d)").expect("static pattern");
    let mut cur = text.to_string();
    loop {
        let next = re.replace_all(&cur, "$1$2").into_owned();
        if next == cur {
            return next;
        }
        cur = next;
    }
}

fn is_ascii_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Insert thousands separators into bare digit runs of 4-7 digits.
///
/// A run qualifies only when its neighbours are not ASCII word characters;
/// kanji, spaces and punctuation count as boundaries, so `売上123456円`
/// becomes `売上123,456円` while `A1234` is left alone. Longer runs (8+)
/// are passed through untouched.
fn regroup_amounts(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let run: String = chars[start..i].iter().collect();
        let left_ok = start == 0 || !is_ascii_word(chars[start - 1]);
        let right_ok = i == chars.len() || !is_ascii_word(chars[i]);
        if (4..=7).contains(&run.len()) && left_ok && right_ok {
            out.push_str(&group_triples(&run));
        } else {
            out.push_str(&run);
        }
    }
    out
}

/// Group a digit string into comma-separated triples from the right.
fn group_triples(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + 2);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}
