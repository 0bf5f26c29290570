use crate::model::PersonnelRecord;

use super::field_patterns::{FieldPatterns, collapse_whitespace, parse_title};

/// Parses a `PP` listing, one record per matching line.
pub(super) fn parse_personnel_listing(patterns: &FieldPatterns, text: &str) -> Vec<PersonnelRecord> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| parse_personnel_line(patterns, index + 1, line))
        .collect()
}

/// `<license> <name> [<role>] [<associated>] [<disassociated>]`. Dates past
/// the second are ignored. Lines without a license number and a name yield
/// nothing.
pub(super) fn parse_personnel_line(
    patterns: &FieldPatterns,
    line_number: usize,
    raw_line: &str,
) -> Option<PersonnelRecord> {
    let line = raw_line.trim();
    let captures = patterns.record_start.captures(line)?;
    let license_number = captures[1].to_string();
    let rest = captures.get(2)?.as_str();

    let mut dates = patterns.date.find_iter(rest);
    let first_date = dates.next();
    let second_date = dates.next();

    let head_end = first_date.map(|found| found.start()).unwrap_or(rest.len());
    let head = &rest[..head_end];

    let (name_text, title) = match patterns.role.find_iter(head).last() {
        Some(role) => (&head[..role.start()], parse_title(role.as_str())),
        None => (head, None),
    };

    let person_name = collapse_whitespace(name_text)
        .trim_matches(|character: char| character == ',' || character.is_whitespace())
        .to_string();
    if !person_name.chars().any(|character| character.is_alphabetic()) {
        return None;
    }

    Some(PersonnelRecord {
        license_number,
        person_name,
        title,
        association_date: first_date.map(|found| found.as_str().to_string()),
        disassociation_date: second_date.map(|found| found.as_str().to_string()),
        line_number,
        raw_text: line.to_string(),
    })
}
