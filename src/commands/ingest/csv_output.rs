use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};

use crate::model::{BusinessRecord, PersonnelRecord};
use crate::util::ensure_directory;

pub(super) const BUSINESS_COLUMNS: [&str; 11] = [
    "license_number",
    "business_name",
    "status",
    "address",
    "city_state_zip",
    "phone",
    "bond_amount",
    "classifications",
    "expire_date",
    "line_number",
    "raw_text",
];

pub(super) const PERSONNEL_COLUMNS: [&str; 7] = [
    "license_number",
    "person_name",
    "title",
    "association_date",
    "disassociation_date",
    "line_number",
    "raw_text",
];

/// A record that renders as one row under a fixed header.
pub(super) trait CsvRecord {
    const COLUMNS: &'static [&'static str];

    /// Value for `column`; absent fields and unknown columns render empty.
    fn column_value(&self, column: &str) -> String;
}

impl CsvRecord for BusinessRecord {
    const COLUMNS: &'static [&'static str] = &BUSINESS_COLUMNS;

    fn column_value(&self, column: &str) -> String {
        match column {
            "license_number" => self.license_number.clone(),
            "business_name" => self.business_name.clone().unwrap_or_default(),
            "status" => self
                .status
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            "address" => self.address.clone().unwrap_or_default(),
            "city_state_zip" => self.city_state_zip.clone().unwrap_or_default(),
            "phone" => self.phone.clone().unwrap_or_default(),
            "bond_amount" => self.bond_amount.clone().unwrap_or_default(),
            "classifications" => self.classifications.join(";"),
            "expire_date" => self.expire_date.clone().unwrap_or_default(),
            "line_number" => self.line_number.to_string(),
            "raw_text" => self.raw_text.clone(),
            _ => String::new(),
        }
    }
}

impl CsvRecord for PersonnelRecord {
    const COLUMNS: &'static [&'static str] = &PERSONNEL_COLUMNS;

    fn column_value(&self, column: &str) -> String {
        match column {
            "license_number" => self.license_number.clone(),
            "person_name" => self.person_name.clone(),
            "title" => self
                .title
                .map(|title| title.as_str().to_string())
                .unwrap_or_default(),
            "association_date" => self.association_date.clone().unwrap_or_default(),
            "disassociation_date" => self.disassociation_date.clone().unwrap_or_default(),
            "line_number" => self.line_number.to_string(),
            "raw_text" => self.raw_text.clone(),
            _ => String::new(),
        }
    }
}

/// Writes the header and one row per record. Fields holding a comma, quote or
/// line break are quoted with inner quotes doubled.
pub(super) fn render_records<R: CsvRecord, W: Write>(writer: W, records: &[R]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);

    csv_writer
        .write_record(R::COLUMNS)
        .context("failed to write csv header")?;
    for record in records {
        csv_writer
            .write_record(R::COLUMNS.iter().map(|column| record.column_value(column)))
            .with_context(|| format!("failed to write csv row for line {}", record.column_value("line_number")))?;
    }
    csv_writer.flush().context("failed to flush csv output")?;
    Ok(())
}

/// Replaces `path` with the rendered records.
pub(super) fn write_records<R: CsvRecord>(path: &Path, records: &[R]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create csv file: {}", path.display()))?;
    render_records(file, records)
        .with_context(|| format!("failed to write csv file: {}", path.display()))
}
