use std::ops::Range;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::model::{BusinessRecord, LicenseStatus, PersonnelTitle};

const STREET_SUFFIXES: &str = "ST|STREET|AVE|AVENUE|BLVD|BOULEVARD|RD|ROAD|DR|DRIVE|LN|LANE|WAY|CT|COURT|PL|PLACE|PKWY|PARKWAY|HWY|HIGHWAY|CIR|CIRCLE|TER|TERRACE";

const CLASSIFICATION_CODE: &str = r"(?:[A-D]-?\d{1,2}|ASB|HAZ)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BusinessField {
    Status,
    BondAmount,
    Phone,
    ExpireDate,
    Address,
    Classification,
    CityStateZip,
}

impl BusinessField {
    /// Repeating fields collect every match on a line; the rest take the first.
    fn repeats(self) -> bool {
        matches!(self, Self::Classification)
    }
}

type Extractor = fn(&Captures<'_>) -> Vec<String>;

pub(super) struct FieldRule {
    pub(super) field: BusinessField,
    pattern: Regex,
    extract: Extractor,
}

/// Compiled patterns shared by both listing parsers.
pub(super) struct FieldPatterns {
    pub(super) record_start: Regex,
    pub(super) date: Regex,
    pub(super) role: Regex,
    page_furniture: Regex,
    pub(super) rules: Vec<FieldRule>,
}

impl FieldPatterns {
    pub(super) fn new() -> Result<Self> {
        let record_start = Regex::new(r"^(\d+)\s+(\S.*)$")
            .context("failed to compile record start regex")?;
        let date = Regex::new(r"\b(\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})|\d{4}-\d{2}-\d{2})\b")
            .context("failed to compile date regex")?;
        let role = Regex::new(
            r"(?i)\b(SOLE OWNER|GENERAL PARTNER|OWNER|RMO|RME|PARTNER|OFFICER|PRESIDENT|CEO|CFO|SECRETARY|TREASURER|VP|MEMBER|MANAGER)\b",
        )
        .context("failed to compile personnel role regex")?;
        let page_furniture = Regex::new(r"(?i)^PAGE\s+\d+(?:\s+OF\s+\d+)?$")
            .context("failed to compile page furniture regex")?;

        let rules = vec![
            FieldRule {
                field: BusinessField::Status,
                pattern: Regex::new(
                    r"(?i)(?:\bSTATUS:?\s*)?\b(ACTIVE|INACTIVE|EXPIRED|SUSPENDED)\b",
                )
                .context("failed to compile status regex")?,
                extract: first_group,
            },
            FieldRule {
                field: BusinessField::BondAmount,
                pattern: Regex::new(r"\$\s?(\d[\d,]*(?:\.\d{2})?)")
                    .context("failed to compile bond amount regex")?,
                extract: |captures| vec![format!("${}", &captures[1])],
            },
            FieldRule {
                field: BusinessField::Phone,
                pattern: Regex::new(r"(?:\(\d{3}\)\s?|\b\d{3}[\s.\-]?)\d{3}[\s.\-]?\d{4}\b")
                    .context("failed to compile phone regex")?,
                extract: whole_match,
            },
            FieldRule {
                field: BusinessField::ExpireDate,
                pattern: date.clone(),
                extract: first_group,
            },
            FieldRule {
                field: BusinessField::Address,
                pattern: Regex::new(&format!(
                    r"(?i)\b\d{{1,6}} (?:[A-Z0-9.'\-]+ ){{0,5}}?(?:{STREET_SUFFIXES})\b\.?(?: (?:STE|SUITE|UNIT|APT|#) ?[A-Z0-9\-]+)?|\bP\.? ?O\.? BOX \d+"
                ))
                .context("failed to compile street address regex")?,
                extract: whole_match,
            },
            FieldRule {
                field: BusinessField::Classification,
                pattern: Regex::new(&format!(
                    r"(?i)\bCLASS(?:IFICATIONS?)?\b:?\s*((?:{CLASSIFICATION_CODE}|[AB])(?:[\s,;/]+(?:{CLASSIFICATION_CODE}|[AB]))*)\b"
                ))
                .context("failed to compile classification list regex")?,
                extract: split_classification_list,
            },
            FieldRule {
                field: BusinessField::Classification,
                pattern: Regex::new(r"\b(?:[ACD]-?\d{1,2}|B-?2|ASB|HAZ)\b")
                    .context("failed to compile classification code regex")?,
                extract: |captures| vec![normalize_classification(&captures[0])],
            },
            FieldRule {
                field: BusinessField::CityStateZip,
                pattern: Regex::new(
                    r"(?i)\b([A-Z][A-Z.'\-]*(?: [A-Z][A-Z.'\-]*){0,3}) ?,? +(CA|CALIFORNIA)\b(?: +(\d{5}(?:-\d{4})?))?",
                )
                .context("failed to compile city/state/zip regex")?,
                extract: city_state_zip,
            },
        ];

        Ok(Self {
            record_start,
            date,
            role,
            page_furniture,
            rules,
        })
    }

    pub(super) fn is_page_furniture(&self, line: &str) -> bool {
        self.page_furniture.is_match(line)
    }

    /// Runs every field rule over `segment` in order and stores matches on
    /// `record`. Matched spans are blanked before the next rule runs so one
    /// token never feeds two fields. Returns the unmatched remainder with
    /// whitespace collapsed.
    pub(super) fn scan_business_segment(&self, segment: &str, record: &mut BusinessRecord) -> String {
        let mut working = segment.to_string();

        for rule in &self.rules {
            let mut consumed = Vec::<Range<usize>>::new();
            for captures in rule.pattern.captures_iter(&working) {
                let Some(whole) = captures.get(0) else {
                    continue;
                };
                let values = (rule.extract)(&captures);
                if values.is_empty() {
                    continue;
                }
                for value in values {
                    apply_field(record, rule.field, value);
                }
                consumed.push(whole.range());
                if !rule.field.repeats() {
                    break;
                }
            }
            for span in consumed {
                let width = span.len();
                working.replace_range(span, &" ".repeat(width));
            }
        }

        collapse_whitespace(&working)
            .trim_matches(|character: char| character == ',' || character == '-' || character.is_whitespace())
            .to_string()
    }
}

fn apply_field(record: &mut BusinessRecord, field: BusinessField, value: String) {
    match field {
        BusinessField::Status => {
            if let Some(status) = LicenseStatus::parse(&value) {
                record.status = Some(status);
            }
        }
        BusinessField::BondAmount => record.bond_amount = Some(value),
        BusinessField::Phone => record.phone = Some(value),
        BusinessField::ExpireDate => record.expire_date = Some(value),
        BusinessField::Address => record.address = Some(value),
        BusinessField::Classification => record.add_classification(value),
        BusinessField::CityStateZip => record.city_state_zip = Some(value),
    }
}

fn first_group(captures: &Captures<'_>) -> Vec<String> {
    captures
        .get(1)
        .map(|value| vec![value.as_str().trim().to_string()])
        .unwrap_or_default()
}

fn whole_match(captures: &Captures<'_>) -> Vec<String> {
    vec![captures[0].trim().to_string()]
}

fn split_classification_list(captures: &Captures<'_>) -> Vec<String> {
    captures
        .get(1)
        .map(|list| {
            list.as_str()
                .split(|character: char| character.is_whitespace() || ",;/".contains(character))
                .filter(|token| !token.is_empty())
                .map(normalize_classification)
                .collect()
        })
        .unwrap_or_default()
}

fn city_state_zip(captures: &Captures<'_>) -> Vec<String> {
    let city = captures[1].trim();
    let state = captures[2].to_ascii_uppercase();
    match captures.get(3) {
        Some(zip) => vec![format!("{city}, {state} {}", zip.as_str())],
        None => vec![format!("{city}, {state}")],
    }
}

/// `c10`, `C10` and `C-10` all normalize to `C-10`.
pub(super) fn normalize_classification(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    let mut chars = upper.chars();
    match (chars.next(), chars.as_str()) {
        (Some(letter), rest)
            if letter.is_ascii_alphabetic()
                && !rest.is_empty()
                && rest.chars().all(|character| character.is_ascii_digit()) =>
        {
            format!("{letter}-{rest}")
        }
        _ => upper,
    }
}

pub(super) fn parse_title(keyword: &str) -> Option<PersonnelTitle> {
    PersonnelTitle::parse(&collapse_whitespace(keyword))
}

pub(super) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
