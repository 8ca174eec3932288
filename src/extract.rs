//! Field extraction and delimiter detection
//!
//! A line is turned into a [`FieldTriple`] without judging the values; the
//! validator decides what is acceptable. Fields the extractor could not locate
//! are `None`, which is distinct from a located but empty value.

use crate::config::DelimiterMode;
use crate::serialize::is_separator_line;
use once_cell::sync::Lazy;
use regex::Regex;

/// `YYYY-MM-DD`
pub static DOB_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid dob pattern"));

/// `DDD-DD-DDDD`
pub static SSN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").expect("valid ssn pattern"));

/// Non-empty lines inspected by auto detection
pub const DETECTION_SAMPLE_LINES: usize = 20;

/// Minimum number of delimited fields on a usable line
pub const MIN_FIELDS: usize = 3;

/// Resolved per-file delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Tab,
    Pipe,
}

impl LineFormat {
    fn delimiter(self) -> char {
        match self {
            LineFormat::Tab => '\t',
            LineFormat::Pipe => '|',
        }
    }
}

/// Raw candidate values pulled from one line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTriple {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub ssn: Option<String>,
}

/// Resolve the delimiter for a whole file.
///
/// Explicit modes pass through. `Auto` samples the first
/// [`DETECTION_SAMPLE_LINES`] non-empty, non-separator lines: any line with at
/// least three pipe fields makes the file pipe delimited, otherwise any line
/// with at least three tab fields makes it tab delimited, otherwise tab.
pub fn detect_format<'a, I>(mode: DelimiterMode, lines: I) -> LineFormat
where
    I: IntoIterator<Item = &'a str>,
{
    match mode {
        DelimiterMode::Tab => return LineFormat::Tab,
        DelimiterMode::Pipe => return LineFormat::Pipe,
        DelimiterMode::Auto => {}
    }

    let sample: Vec<&str> = lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator_line(line))
        .take(DETECTION_SAMPLE_LINES)
        .collect();

    let pipe_delimited = sample
        .iter()
        .any(|line| line.contains('|') && line.split('|').count() >= MIN_FIELDS);

    if pipe_delimited {
        LineFormat::Pipe
    } else {
        // three or more tab fields, or nothing recognisable: both mean tab
        LineFormat::Tab
    }
}

/// Extract name, date of birth and SSN candidates from a trimmed line
pub fn extract_fields(line: &str, format: LineFormat) -> FieldTriple {
    let columns: Vec<&str> = line.split(format.delimiter()).collect();
    if columns.len() < MIN_FIELDS {
        return FieldTriple::default();
    }

    match format {
        LineFormat::Pipe => extract_positional(&columns),
        LineFormat::Tab => extract_by_pattern(&columns),
    }
}

fn extract_positional(columns: &[&str]) -> FieldTriple {
    FieldTriple {
        name: Some(columns[0].trim().to_string()),
        dob: Some(columns[1].trim().to_string()),
        ssn: Some(columns[2].trim().to_string()),
    }
}

fn extract_by_pattern(columns: &[&str]) -> FieldTriple {
    let dob = columns
        .iter()
        .map(|c| c.trim())
        .find(|c| DOB_PATTERN.is_match(c) && !c.contains("-00"))
        .map(str::to_string);

    let ssn = columns
        .iter()
        .map(|c| c.trim())
        .find(|c| SSN_PATTERN.is_match(c))
        .map(str::to_string);

    FieldTriple {
        name: Some(name_from_columns(columns)),
        dob,
        ssn,
    }
}

/// Column 1 is the base name; columns 2 and 3 join it unless they start with a digit
fn name_from_columns(columns: &[&str]) -> String {
    let mut tokens: Vec<&str> = Vec::with_capacity(3);

    if let Some(base) = columns.get(1).map(|c| c.trim()) {
        if !base.is_empty() {
            tokens.push(base);
        }
    }

    for column in columns.iter().skip(2).take(2).map(|c| c.trim()) {
        let starts_with_digit = column.chars().next().map_or(false, |c| c.is_ascii_digit());
        if !column.is_empty() && !starts_with_digit {
            tokens.push(column);
        }
    }

    tokens.join(" ").trim().to_string()
}
