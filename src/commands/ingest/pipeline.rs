use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::model::{BusinessRecord, FileResult, PersonnelRecord, RecordKind};
use crate::util::{file_name_lossy, sha256_file};

use super::business_parse::parse_business_listing;
use super::csv_output::write_records;
use super::extraction::TextExtractor;
use super::field_patterns::FieldPatterns;
use super::personnel_parse::parse_personnel_listing;

/// Records parsed from one source document.
#[derive(Debug, Clone)]
pub(super) enum ParsedListing {
    Business(Vec<BusinessRecord>),
    Personnel(Vec<PersonnelRecord>),
}

impl ParsedListing {
    pub(super) fn parse(kind: RecordKind, patterns: &FieldPatterns, text: &str) -> Self {
        match kind {
            RecordKind::Business => Self::Business(parse_business_listing(patterns, text)),
            RecordKind::Personnel => Self::Personnel(parse_personnel_listing(patterns, text)),
        }
    }

    pub(super) fn kind(&self) -> RecordKind {
        match self {
            Self::Business(_) => RecordKind::Business,
            Self::Personnel(_) => RecordKind::Personnel,
        }
    }

    pub(super) fn len(&self) -> usize {
        match self {
            Self::Business(records) => records.len(),
            Self::Personnel(records) => records.len(),
        }
    }

    fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Business(records) => write_records(path, records),
            Self::Personnel(records) => write_records(path, records),
        }
    }
}

/// Result of converting one document. `listing` is present only on success.
#[derive(Debug)]
pub(super) struct DocumentOutcome {
    pub(super) result: FileResult,
    pub(super) listing: Option<ParsedListing>,
}

pub(super) fn csv_path_for(csv_dir: &Path, pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    csv_dir.join(format!("{stem}.csv"))
}

/// Extracts, parses and serializes one source document. Failures are
/// captured on the returned `FileResult` instead of propagating.
pub(super) fn process_document(
    pdf_path: &Path,
    kind: RecordKind,
    extractor: &TextExtractor,
    patterns: &FieldPatterns,
    csv_dir: &Path,
) -> DocumentOutcome {
    let filename = file_name_lossy(pdf_path);
    let source_sha256 = match sha256_file(pdf_path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            warn!(file = %filename, error = %format!("{err:#}"), "could not hash source document");
            None
        }
    };

    match convert_document(pdf_path, &filename, kind, extractor, patterns, csv_dir) {
        Ok((listing, output_path)) => {
            info!(
                file = %filename,
                kind = kind.as_str(),
                records = listing.len(),
                output = %output_path.display(),
                "parsed source document"
            );
            DocumentOutcome {
                result: FileResult {
                    filename,
                    kind,
                    record_count: listing.len(),
                    output_path: Some(output_path.display().to_string()),
                    source_sha256,
                    success: true,
                    error: None,
                },
                listing: Some(listing),
            }
        }
        Err(err) => {
            warn!(file = %filename, kind = kind.as_str(), error = %err, "source document failed");
            DocumentOutcome {
                result: FileResult {
                    filename,
                    kind,
                    record_count: 0,
                    output_path: None,
                    source_sha256,
                    success: false,
                    error: Some(err.to_string()),
                },
                listing: None,
            }
        }
    }
}

fn convert_document(
    pdf_path: &Path,
    filename: &str,
    kind: RecordKind,
    extractor: &TextExtractor,
    patterns: &FieldPatterns,
    csv_dir: &Path,
) -> Result<(ParsedListing, PathBuf), PipelineError> {
    let extracted = extractor.extract(pdf_path)?;
    debug!(
        file = %filename,
        source = extracted.source.as_str(),
        path = %extracted.text_path.display(),
        "text ready"
    );
    let listing = ParsedListing::parse(kind, patterns, &extracted.text);

    let output_path = csv_path_for(csv_dir, pdf_path);
    listing
        .write_csv(&output_path)
        .map_err(|err| PipelineError::Parse {
            filename: filename.to_string(),
            detail: format!("{err:#}"),
        })?;

    Ok((listing, output_path))
}
