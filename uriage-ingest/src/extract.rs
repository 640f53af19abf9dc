//! Item extraction: pull one `(ItemKind, Amount)` pair out of a data line.

use regex::Regex;

use uriage_core::ItemKind;

/// Extract the item carried by one formatted line.
///
/// An amount requires a yen-suffixed number; a line without one contributes
/// nothing (that is not an error). Kind precedence: explicit bracketed label,
/// then keyword substring in fixed order (売上, P/A, 社員, 人件費, 仕入), then
/// whatever text precedes the first digit as an `Other` label. Role keywords
/// beat the generic 人件費 label when both appear on one line.
pub fn extract_item(line: &str) -> Option<(ItemKind, u64)> {
    let yen_re = Regex::new(r"([0-9,]+)\s*円").expect("static pattern");
    let caps = yen_re.captures(line)?;
    let amount: u64 = caps[1].replace(',', "").parse().ok()?;

    if let Some(kind) = bracket_kind(line).or_else(|| keyword_kind(line)) {
        return Some((kind, amount));
    }

    // Fallback: the text before the first digit run names the item.
    let digit_re = Regex::new(r"[0-9,]+").expect("static pattern");
    let prefix = match digit_re.find(line) {
        Some(m) => line[..m.start()].trim(),
        None => "",
    };
    if prefix.is_empty() {
        return None;
    }
    Some((ItemKind::Other(prefix.to_string()), amount))
}

/// Kind from an explicit 【…】 label, when present.
fn bracket_kind(line: &str) -> Option<ItemKind> {
    let bracket_re = Regex::new(r"【(.+?)】").expect("static pattern");
    let label = bracket_re.captures(line)?.get(1)?.as_str().to_string();
    Some(match label.as_str() {
        "売上" => ItemKind::Revenue,
        "人件費" => {
            if line.contains("P/A") {
                ItemKind::LaborPartTime
            } else if line.contains("社員") {
                ItemKind::LaborFullTime
            } else {
                ItemKind::LaborTotal
            }
        }
        "仕入費" | "仕入" => ItemKind::Purchase,
        _ => ItemKind::Other(label),
    })
}

/// Kind from a bare keyword, in fixed precedence order.
fn keyword_kind(line: &str) -> Option<ItemKind> {
    if line.contains("売上") {
        Some(ItemKind::Revenue)
    } else if line.contains("P/A") {
        Some(ItemKind::LaborPartTime)
    } else if line.contains("社員") {
        Some(ItemKind::LaborFullTime)
    } else if line.contains("人件費") {
        Some(ItemKind::LaborTotal)
    } else if line.contains("仕入") {
        Some(ItemKind::Purchase)
    } else {
        None
    }
}
