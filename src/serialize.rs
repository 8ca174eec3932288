//! Rendering sorted records back to pipe-delimited text

use crate::config::GroupKey;
use crate::record::Record;

/// Prefix of a group separator line
pub const SEPARATOR_MARKER: &str = "====================================";

/// Separator lines are never records, including on re-ingestion
pub fn is_separator_line(line: &str) -> bool {
    line.contains(SEPARATOR_MARKER)
}

/// Value of the grouping key for one record
pub fn group_value(record: &Record, key: GroupKey) -> String {
    match key {
        GroupKey::FullName => record.full_name(),
        GroupKey::LastName => record.last_name.clone(),
        GroupKey::Dob => record.dob.clone(),
    }
}

/// `name|dob|ssn`
pub fn record_line(record: &Record) -> String {
    format!("{}|{}|{}", record.name, record.dob, record.ssn)
}

/// Render records in order, one per line, joined with `\n`.
///
/// With separators enabled, a `SEPARATOR_MARKER <group>` line goes before every
/// record whose group differs from the previous record's. The first record never
/// gets one.
pub fn serialize(records: &[Record], include_separators: bool, key: GroupKey) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(records.len());
    let mut previous: Option<String> = None;

    for record in records {
        if include_separators {
            let group = group_value(record, key);
            if previous.as_ref().map_or(false, |prev| *prev != group) {
                lines.push(format!("{SEPARATOR_MARKER} {group}"));
            }
            previous = Some(group);
        }
        lines.push(record_line(record));
    }

    lines.join("\n")
}

/// Suggested output file name for an input file name
pub fn suggested_output_name(input_name: &str, include_separators: bool) -> String {
    let base = if input_name.to_ascii_lowercase().ends_with(".txt") {
        &input_name[..input_name.len() - 4]
    } else {
        input_name
    };

    if include_separators {
        format!("{base}_sorted_grouped.txt")
    } else {
        format!("{base}_sorted.txt")
    }
}

/// One row of the human-readable preview
pub fn preview_line(record: &Record) -> String {
    format!("{} | {} | {}", record.name, record.dob, record.ssn)
}
