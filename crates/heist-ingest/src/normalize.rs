//! CSV normalizer — maps heterogeneous export rows onto [`ExpenseRecord`].
//!
//! Only a structurally broken file is an error. Inside a row every cell is
//! coerced leniently: unparseable dates fall back to the capture time,
//! unparseable amounts to zero, unknown booleans to false.

use std::io::Read;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use heist_core::{Error, Result};
use rust_decimal::Decimal;
use tracing::debug;

use crate::aliases::Field;
use crate::record::ExpenseRecord;

/// Characters dropped from amounts before parsing: currency symbols and
/// thousands separators.
const AMOUNT_NOISE: &[char] = &['$', '€', '£', '¥', ','];

const AFFIRMATIVE: &[&str] = &["yes", "true", "1", "y"];

#[derive(Debug, Clone, Copy)]
enum DatePattern {
    Date(&'static str),
    DateTime(&'static str),
}

/// Tried in order; the first pattern that parses wins.
const DATE_PATTERNS: &[DatePattern] = &[
    DatePattern::Date("%Y-%m-%d"),
    DatePattern::Date("%m/%d/%Y"),
    DatePattern::Date("%m/%d/%y"),
    DatePattern::Date("%d/%m/%Y"),
    DatePattern::Date("%d/%m/%y"),
    DatePattern::DateTime("%Y-%m-%d %H:%M:%S"),
    DatePattern::DateTime("%m/%d/%Y %H:%M:%S"),
    DatePattern::Date("%B %d, %Y"),
    DatePattern::Date("%b %d, %Y"),
];

impl DatePattern {
    fn parse(self, raw: &str) -> Option<NaiveDateTime> {
        let (format, parsed) = match self {
            Self::Date(format) => (
                format,
                NaiveDate::parse_from_str(raw, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
            ),
            Self::DateTime(format) => (format, NaiveDateTime::parse_from_str(raw, format).ok()),
        };
        let parsed = parsed?;
        // %Y accepts short years; "03/14/24" belongs to the %y patterns
        if format.contains("%Y") && parsed.year() < 1000 {
            return None;
        }
        Some(parsed)
    }
}

/// Parse export text. Missing dates fall back to the current local time.
pub fn parse(text: &str) -> Result<Vec<ExpenseRecord>> {
    parse_at(text, Local::now().naive_local())
}

/// Parse raw export bytes; anything that is not UTF-8 is rejected.
pub fn parse_reader(mut reader: impl Read) -> Result<Vec<ExpenseRecord>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::MalformedInput(format!("export is not valid UTF-8: {}", e)))?;
    parse(&text)
}

/// Parse export text with an explicit capture time for rows without a date.
pub fn parse_at(text: &str, captured_at: NaiveDateTime) -> Result<Vec<ExpenseRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(malformed)?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let cells = row.map_err(malformed)?;
        let row = Row {
            headers: &headers,
            cells: &cells,
        };
        records.push(row.normalize(captured_at));
    }

    debug!("Parsed {} expense rows ({} columns)", records.len(), headers.len());
    Ok(records)
}

fn malformed(e: csv::Error) -> Error {
    Error::MalformedInput(e.to_string())
}

struct Row<'a> {
    headers: &'a StringRecord,
    cells: &'a StringRecord,
}

impl<'a> Row<'a> {
    /// Value of the first alias of `field` this row carries.
    fn get(&self, field: Field) -> Option<&'a str> {
        field.aliases().iter().find_map(|alias| self.lookup(alias))
    }

    /// Exact header match first, then case-insensitive. The leftmost
    /// matching column wins; a cell beyond the end of a short row is absent.
    fn lookup(&self, alias: &str) -> Option<&'a str> {
        let headers = self.headers;
        let index = headers.iter().position(|h| h == alias).or_else(|| {
            let wanted = alias.to_lowercase();
            headers.iter().position(|h| h.to_lowercase() == wanted)
        })?;
        self.cells.get(index)
    }

    fn normalize(&self, captured_at: NaiveDateTime) -> ExpenseRecord {
        ExpenseRecord {
            occurred_at: self
                .get(Field::Date)
                .and_then(parse_date)
                .unwrap_or(captured_at),
            merchant: text_or(self.get(Field::Merchant), "Unknown"),
            amount: self.get(Field::Amount).map(parse_amount).unwrap_or_default(),
            currency: text_or(self.get(Field::Currency), "USD"),
            category: self.get(Field::Category).unwrap_or_default().to_string(),
            tag: optional(self.get(Field::Tag)),
            description: optional(self.get(Field::Description)),
            report_name: optional(self.get(Field::ReportName)),
            reimbursable: self.get(Field::Reimbursable).is_some_and(parse_bool),
            billable: self.get(Field::Billable).is_some_and(parse_bool),
            receipt_reference: optional(self.get(Field::Receipt)),
        }
    }
}

fn text_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_PATTERNS.iter().find_map(|pattern| pattern.parse(raw))
}

/// `"$1,234.50"` → 1234.50, `"($12.50)"` → -12.50, garbage → 0.
pub fn parse_amount(raw: &str) -> Decimal {
    let stripped: String = raw.chars().filter(|c| !AMOUNT_NOISE.contains(c)).collect();
    let stripped = stripped.trim();
    let cleaned = match stripped.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => format!("-{}", inner.trim()),
        None => stripped.to_string(),
    };

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or_else(|_| {
            if !cleaned.is_empty() {
                debug!("Unparseable amount {:?}, using zero", raw);
            }
            Decimal::ZERO
        })
}

pub fn parse_bool(raw: &str) -> bool {
    let raw = raw.trim();
    AFFIRMATIVE.iter().any(|t| raw.eq_ignore_ascii_case(t))
}
