//! Date parsing for report anchors and ledger headers.

use chrono::{Duration, NaiveDate};
use regex::Regex;

/// Days between the spreadsheet serial epoch (1899-12-30) and 1970-01-01.
const SERIAL_UNIX_EPOCH: f64 = 25569.0;

/// Parse the date carried by an anchor line.
///
/// A leading `HH:MM <user> ` chat prefix and any parenthesized weekday
/// annotation (half- or full-width) are stripped first, and commas between
/// digits are removed so `2,025/4/11` reads as a year. An explicit year
/// pattern wins; a bare `M月D日` falls back to `current_year`. Returns `None`
/// when nothing matches or the components are not a real calendar date.
pub fn parse_report_date(text: &str, current_year: i32) -> Option<NaiveDate> {
    let prefix_re = Regex::new(r"^\d{2}:\d{2}\s+\S+\s+").expect("static pattern");
    let paren_re = Regex::new(r"[\(（][^）\)]*[\)）]").expect("static pattern");
    let comma_re = Regex::new(r"(\d),(\d)").expect("static pattern");

    let mut text = prefix_re.replace(text, "").into_owned();
    text = paren_re.replace_all(&text, "").into_owned();
    loop {
        let next = comma_re.replace_all(&text, "$1$2").into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    let full_re =
        Regex::new(r"(\d{4})[/\-年](\d{1,2})[/\-月]?(\d{1,2})日?").expect("static pattern");
    if let Some(caps) = full_re.captures(&text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let md_re = Regex::new(r"(\d{1,2})月\s*(\d{1,2})日?").expect("static pattern");
    if let Some(caps) = md_re.captures(&text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(current_year, month, day);
    }

    None
}

/// Interpret a spreadsheet date-serial number, truncating any time-of-day
/// fraction.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 {
        return None;
    }
    let days = serial.floor() - SERIAL_UNIX_EPOCH;
    NaiveDate::from_ymd_opt(1970, 1, 1).and_then(|epoch| {
        epoch.checked_add_signed(Duration::days(days as i64))
    })
}

/// Parse a ledger header cell into a date, stripping time-of-day.
///
/// Accepted forms, first match wins: a serial number, `Y/M/D` or `Y-M-D`
/// (optionally followed by a time), and `M月D日` resolved against
/// `period_year`.
pub fn parse_header_date(cell: &str, period_year: i32) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(serial) = cell.parse::<f64>() {
        return serial_to_date(serial);
    }
    let date_part = cell.split_whitespace().next().unwrap_or(cell);
    for fmt in ["%Y/%m/%d", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(d);
        }
    }
    let md_re = Regex::new(r"^(\d{1,2})月(\d{1,2})日?$").expect("static pattern");
    if let Some(caps) = md_re.captures(cell) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(period_year, month, day);
    }
    None
}
