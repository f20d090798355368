// Cell-level value parsing.
//
// This module centralizes all the "dirty" number/date handling so the
// rest of the pipeline can assume clean, typed values. Both contracts
// are total: a cell that cannot be converted yields `Parsed::Unparseable`
// instead of an error, and a blank cell yields `Parsed::Missing`.
use chrono::NaiveDate;

use crate::config::CurrencyTable;
use crate::types::{CellValue, Parsed};

/// Parse a raw cell into a canonical `f64`.
///
/// Tolerated string shapes, in the order they are handled:
/// - currency symbols and code words per the configured table (`€`, `EUR`,
///   `$`, `Dollar`, ...), stripped case-sensitively;
/// - a trailing magnitude suffix `k`/`K` (×1,000) or `m`/`M` (×1,000,000),
///   remembered and applied after the numeral is read;
/// - embedded whitespace (`1 500,50`);
/// - ambiguous `,`/`.` separators: when both occur, the later one is the
///   decimal separator and the earlier one is dropped; a lone separator
///   appearing more than once is a thousands separator; a single `,` is a
///   decimal comma, a single `.` the decimal point.
pub fn parse_number(cell: &CellValue, currencies: &CurrencyTable) -> Parsed<f64> {
    match cell {
        CellValue::Number(n) if n.is_nan() => Parsed::Missing,
        CellValue::Number(n) => Parsed::Value(*n),
        CellValue::Null => Parsed::Missing,
        // A date in a cost column is present but not a number.
        CellValue::Date(_) => Parsed::Unparseable,
        CellValue::Text(s) => parse_number_str(s, currencies),
    }
}

fn parse_number_str(s: &str, currencies: &CurrencyTable) -> Parsed<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Parsed::Missing;
    }

    let mut v = trimmed.to_string();
    for sym in currencies.symbols() {
        if v.contains(sym) {
            v = v.replace(sym, "");
        }
    }
    let mut v = v.trim().to_string();

    let mut multiplier = 1.0;
    if v.ends_with('k') || v.ends_with('K') {
        multiplier = 1_000.0;
        v.pop();
    } else if v.ends_with('m') || v.ends_with('M') {
        multiplier = 1_000_000.0;
        v.pop();
    }

    let v: String = v.chars().filter(|c| !c.is_whitespace()).collect();
    if v.is_empty() {
        // There was content (a bare symbol, say) but no numeral.
        return Parsed::Unparseable;
    }

    match normalize_separators(&v).parse::<f64>() {
        Ok(n) => Parsed::Value(n * multiplier),
        Err(_) => Parsed::Unparseable,
    }
}

/// Resolve the `,` vs `.` ambiguity of mixed-locale numerals.
fn normalize_separators(v: &str) -> String {
    let has_comma = v.contains(',');
    let has_dot = v.contains('.');
    if has_comma && has_dot {
        // The separator appearing later in the string is the decimal one.
        if v.rfind(',') > v.rfind('.') {
            v.replace('.', "").replace(',', ".")
        } else {
            v.replace(',', "")
        }
    } else if has_comma {
        if v.matches(',').count() > 1 {
            v.replace(',', "")
        } else {
            v.replace(',', ".")
        }
    } else if has_dot {
        if v.matches('.').count() > 1 {
            v.replace('.', "")
        } else {
            v.to_string()
        }
    } else {
        v.to_string()
    }
}

/// Like [`parse_number`], but tolerates a trailing percent sign
/// (progress and confidence columns export values like `"75%"`).
pub fn parse_percent(cell: &CellValue, currencies: &CurrencyTable) -> Parsed<f64> {
    match cell {
        CellValue::Text(s) => {
            let t = s.trim();
            let t = t.strip_suffix('%').unwrap_or(t);
            parse_number_str(t, currencies)
        }
        other => parse_number(other, currencies),
    }
}

// Fixed patterns tried in order; first full match wins. Day-first
// formats come before month-first, so `31/12/2024` resolves via
// `%d/%m/%Y` only after `%m/%d/%Y` has rejected month 31. The 2-digit
// year variants sit before their 4-digit siblings: `%y` never consumes
// more than two digits, while `%Y` would happily read "24" as year 24.
const DATE_PATTERNS: [&str; 8] = [
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

// Month-name forms resolve to the first day of the month.
const MONTH_YEAR_PATTERNS: [&str; 2] = ["%d %B %Y", "%d %b %Y"];

/// Parse a raw cell into a calendar date.
pub fn parse_date(cell: &CellValue) -> Parsed<NaiveDate> {
    match cell {
        CellValue::Date(d) => Parsed::Value(*d),
        CellValue::Null => Parsed::Missing,
        CellValue::Number(n) if n.is_nan() => Parsed::Missing,
        // A numeric cell can still be a bare year.
        CellValue::Number(n) => match parse_date_str(&format!("{}", n)) {
            Some(d) => Parsed::Value(d),
            None => Parsed::Unparseable,
        },
        CellValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Parsed::Missing;
            }
            match parse_date_str(t) {
                Some(d) => Parsed::Value(d),
                None => Parsed::Unparseable,
            }
        }
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    for fmt in DATE_PATTERNS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // "December 2024" / "Dec 2024": borrow day 1 so chrono has a full date.
    let padded = format!("1 {}", s);
    for fmt in MONTH_YEAR_PATTERNS {
        if let Ok(d) = NaiveDate::parse_from_str(&padded, fmt) {
            return Some(d);
        }
    }

    // Bare year ("2024") maps to January 1st.
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(y) = s.parse::<i32>() {
            return NaiveDate::from_ymd_opt(y, 1, 1);
        }
    }

    permissive_day_first(s)
}

/// Last-resort parse of a numeric component triple, biased toward
/// day-first interpretation. A leading 4-digit component flips to
/// year-first; an impossible month swaps with the day.
fn permissive_day_first(s: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = s
        .split(|c: char| matches!(c, '.' | '/' | '-' | ',') || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != 3 {
        return None;
    }
    let nums: Vec<i64> = tokens
        .iter()
        .map(|t| t.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let (mut d, mut m, y);
    if nums[0] >= 1000 {
        y = nums[0];
        m = nums[1];
        d = nums[2];
    } else {
        d = nums[0];
        m = nums[1];
        let mut full_year = nums[2];
        if full_year < 100 {
            full_year += if full_year < 70 { 2000 } else { 1900 };
        }
        y = full_year;
    }
    if m > 12 && d <= 12 {
        std::mem::swap(&mut d, &mut m);
    }
    if !(1..=31).contains(&d) || !(1..=12).contains(&m) {
        return None;
    }
    NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32)
}

/// Text contract: trim and stringify, blank becomes `None`.
pub fn parse_text(cell: &CellValue) -> Option<String> {
    cell.as_text()
}
